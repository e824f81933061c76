use std::{any::Any, fmt, sync::Arc};

/// A constructor argument supplied by the host when it creates a processor.
///
/// Scalars, strings and opaque objects. Objects carry a type name that
/// [`ParamType::Named`] matches against.
#[derive(Clone)]
pub enum ArgValue {
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    Str(Arc<str>),
    Object {
        type_name: Arc<str>,
        value: Arc<dyn Any + Send + Sync>,
    },
}

impl ArgValue {
    pub fn object<T: Any + Send + Sync>(type_name: impl Into<Arc<str>>, value: T) -> Self {
        ArgValue::Object {
            type_name: type_name.into(),
            value: Arc::new(value),
        }
    }

    /// Name of the argument's runtime type, used in resolution errors.
    pub fn type_name(&self) -> &str {
        match self {
            ArgValue::Bool(_) => "bool",
            ArgValue::Byte(_) => "byte",
            ArgValue::Short(_) => "short",
            ArgValue::Int(_) => "int",
            ArgValue::Long(_) => "long",
            ArgValue::Float(_) => "float",
            ArgValue::Double(_) => "double",
            ArgValue::Char(_) => "char",
            ArgValue::Str(_) => "String",
            ArgValue::Object { type_name, .. } => type_name,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            ArgValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            ArgValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            ArgValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow an object argument as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            ArgValue::Object { value, .. } => value.downcast_ref(),
            _ => None,
        }
    }
}

impl fmt::Debug for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Bool(v) => write!(f, "Bool({v})"),
            ArgValue::Byte(v) => write!(f, "Byte({v})"),
            ArgValue::Short(v) => write!(f, "Short({v})"),
            ArgValue::Int(v) => write!(f, "Int({v})"),
            ArgValue::Long(v) => write!(f, "Long({v})"),
            ArgValue::Float(v) => write!(f, "Float({v})"),
            ArgValue::Double(v) => write!(f, "Double({v})"),
            ArgValue::Char(v) => write!(f, "Char({v:?})"),
            ArgValue::Str(v) => write!(f, "Str({v:?})"),
            ArgValue::Object { type_name, .. } => write!(f, "Object({type_name})"),
        }
    }
}

macro_rules! arg_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for ArgValue {
                fn from(v: $ty) -> Self {
                    ArgValue::$variant(v)
                }
            }
        )*
    };
}

arg_from! {
    bool => Bool,
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    char => Char,
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        ArgValue::Str(Arc::from(v))
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        ArgValue::Str(Arc::from(v))
    }
}

/// A declared constructor parameter type.
///
/// Scalar parameters accept exactly their own kind: an `Int` argument is
/// never widened into a `Long` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
    Str,
    /// Accepts any argument.
    Object,
    /// Accepts an object argument with this type name.
    Named(Arc<str>),
}

impl ParamType {
    pub fn named(type_name: impl Into<Arc<str>>) -> Self {
        ParamType::Named(type_name.into())
    }

    /// Returns true if an argument of this runtime type can be passed here.
    pub fn accepts(&self, arg: &ArgValue) -> bool {
        match (self, arg) {
            (ParamType::Object, _) => true,
            (ParamType::Bool, ArgValue::Bool(_))
            | (ParamType::Byte, ArgValue::Byte(_))
            | (ParamType::Short, ArgValue::Short(_))
            | (ParamType::Int, ArgValue::Int(_))
            | (ParamType::Long, ArgValue::Long(_))
            | (ParamType::Float, ArgValue::Float(_))
            | (ParamType::Double, ArgValue::Double(_))
            | (ParamType::Char, ArgValue::Char(_))
            | (ParamType::Str, ArgValue::Str(_)) => true,
            (ParamType::Named(expected), ArgValue::Object { type_name, .. }) => {
                expected == type_name
            }
            _ => false,
        }
    }
}
