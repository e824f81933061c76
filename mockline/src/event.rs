/// Marker trait for messages flowing through intercepted processors.
///
/// Implement this for your message type (often an enum or a small struct
/// with a payload and properties). Messages must be
/// `Send + Sync + Clone + 'static` because they:
/// - Cross execution contexts when the host pipeline fans out (Send, Sync)
/// - Are stored inside registered behaviors and returned on every match (Clone)
/// - Are captured by spy hooks that outlive a single invocation ('static)
///
/// # Example
///
/// ```rust
/// use mockline::Event;
///
/// #[derive(Clone, Debug)]
/// struct Message {
///     payload: String,
/// }
///
/// impl Event for Message {}
/// ```
pub trait Event: Send + Sync + Clone + 'static {}

impl Event for String {}
