//! # function
//!
//! Callables the evaluator can invoke by name.
//!
//! Every callable is a [`Function`]: it declares a fixed arity and takes
//! its arguments as a slice. Plain Rust functions and closures of zero to
//! six `f64` parameters become [`Function`]s through [`IntoFunction`];
//! anything else can be wrapped in a [`ClosureFunction`] with an explicit
//! arity.
//!
//! ## Example
//! ```rust
//! # use formulas::FunctionTable;
//! let mut functions = FunctionTable::new();
//! functions
//!     .register("hypot", f64::hypot)
//!     .register("pi", || std::f64::consts::PI)
//!     .register_closure("sum3", 3, |xs| xs.iter().sum());
//!
//! let hypot = functions.get("hypot").unwrap();
//! assert_eq!(hypot.arity(), 2);
//! assert_eq!(hypot.invoke(&[3.0, 4.0]).unwrap(), 5.0);
//! assert!(hypot.invoke(&[3.0]).is_err());
//! ```

use indexmap::IndexMap;
use smartstring::alias::String;
use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;

/// A callable was handed the wrong number of arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("expected {expected} arguments, {supplied} supplied")]
pub struct ArityError {
    pub expected: usize,
    pub supplied: usize,
}

/// A named numeric callable with a fixed number of parameters.
pub trait Function: Send + Sync {
    /// Number of arguments [`Function::invoke`] accepts.
    fn arity(&self) -> usize;

    /// Calls the function. Fails when `arguments.len() != self.arity()`;
    /// no other validation is done, NaN and infinities pass through.
    fn invoke(&self, arguments: &[f64]) -> Result<f64, ArityError>;
}

/// Conversion of a native Rust callable into a [`Function`].
///
/// `Args` is the tuple of parameter types and only serves to tell the
/// per-arity implementations apart.
pub trait IntoFunction<Args> {
    type Function: Function + 'static;

    fn into_function(self) -> Self::Function;
}

/// A native callable with its parameter list fixed at compile time.
pub struct NativeFunction<F, Args> {
    f: F,
    _args: PhantomData<fn(Args)>,
}

impl<F, Args> NativeFunction<F, Args> {
    pub fn new(f: F) -> Self {
        Self {
            f,
            _args: PhantomData,
        }
    }
}

macro_rules! native_arity {
    (@f64 $arg:ident) => { f64 };
    ($n:literal; $($arg:ident),*) => {
        impl<F> Function for NativeFunction<F, ($(native_arity!(@f64 $arg),)*)>
        where
            F: Fn($(native_arity!(@f64 $arg)),*) -> f64 + Send + Sync,
        {
            #[inline]
            fn arity(&self) -> usize {
                $n
            }

            fn invoke(&self, arguments: &[f64]) -> Result<f64, ArityError> {
                match *arguments {
                    [$($arg),*] => Ok((self.f)($($arg),*)),
                    _ => Err(ArityError {
                        expected: $n,
                        supplied: arguments.len(),
                    }),
                }
            }
        }

        impl<F> IntoFunction<($(native_arity!(@f64 $arg),)*)> for F
        where
            F: Fn($(native_arity!(@f64 $arg)),*) -> f64 + Send + Sync + 'static,
        {
            type Function = NativeFunction<F, ($(native_arity!(@f64 $arg),)*)>;

            fn into_function(self) -> Self::Function {
                NativeFunction::new(self)
            }
        }
    };
}

native_arity!(0;);
native_arity!(1; a);
native_arity!(2; a, b);
native_arity!(3; a, b, c);
native_arity!(4; a, b, c, d);
native_arity!(5; a, b, c, d, e);
native_arity!(6; a, b, c, d, e, f);

/// A slice-taking closure with a declared arity.
pub struct ClosureFunction {
    arity: usize,
    f: Box<dyn Fn(&[f64]) -> f64 + Send + Sync>,
}

impl ClosureFunction {
    pub fn new<F>(arity: usize, f: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        Self {
            arity,
            f: Box::new(f),
        }
    }
}

impl Function for ClosureFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn invoke(&self, arguments: &[f64]) -> Result<f64, ArityError> {
        if arguments.len() != self.arity {
            return Err(ArityError {
                expected: self.arity,
                supplied: arguments.len(),
            });
        }
        Ok((self.f)(arguments))
    }
}

/// Functions by name, in registration order.
#[derive(Default)]
pub struct FunctionTable {
    tab: IndexMap<String, Box<dyn Function>>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a native callable, replacing any function of the same name.
    pub fn register<Args, F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: IntoFunction<Args>,
    {
        self.insert(name, Box::new(f.into_function()))
    }

    /// Registers a slice-taking closure of the given arity.
    pub fn register_closure<F>(&mut self, name: &str, arity: usize, f: F) -> &mut Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        self.insert(name, Box::new(ClosureFunction::new(arity, f)))
    }

    /// Registers any [`Function`].
    pub fn insert(&mut self, name: &str, function: Box<dyn Function>) -> &mut Self {
        self.tab.insert(String::from(name), function);
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn Function> {
        self.tab.get(name).map(|f| f.as_ref())
    }

    pub fn len(&self) -> usize {
        self.tab.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tab.is_empty()
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tab.keys().map(|k| k.as_str())
    }
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.tab.iter().map(|(name, func)| (name, func.arity())))
            .finish()
    }
}
