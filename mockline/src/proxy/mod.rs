//! Building interceptable processors from registered types.
//!
//! Each concrete processor type is registered once as a [`ProcessorClass`]
//! listing its constructors. The [`ProxyFactory`] picks a constructor by
//! matching the supplied [`ArgValue`]s against declared [`ParamType`]s, then
//! wraps the instance in an [`Interceptable`](crate::Interceptable), or
//! returns it as-is when the type cannot be intercepted.

mod arg;
mod class;
mod factory;

pub use arg::{ArgValue, ParamType};
pub use class::{Constructor, ProcessorClass};
pub use factory::{Instance, ProxyFactory};
