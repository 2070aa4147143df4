/// Forward methods of [`AnyMatrix`](crate::matrix::AnyMatrix) to the [`FieldMatrix`]
/// implementation of whichever encoding it holds.
///
/// [`FieldMatrix`]: crate::matrix::FieldMatrix
macro_rules! dispatch_matrix_inner {
    ($vis:vis fn $method:ident(&mut self $(, $arg:ident: $ty:ty )* ) $(-> $ret:ty)?) => {
        #[allow(unused_parens)]
        $vis fn $method(&mut self, $($arg: $ty),* ) $(-> $ret)* {
            match self {
                Self::Generic(ref mut x) => x.$method($($arg),*),
                Self::Batched(ref mut x) => x.$method($($arg),*),
                Self::Packed(ref mut x) => x.$method($($arg),*),
            }
        }
    };
    ($vis:vis fn $method:ident(&self $(, $arg:ident: $ty:ty )* ) $(-> $ret:ty)?) => {
        #[allow(unused_parens)]
        $vis fn $method(&self, $($arg: $ty),* ) $(-> $ret)* {
            match self {
                Self::Generic(ref x) => x.$method($($arg),*),
                Self::Batched(ref x) => x.$method($($arg),*),
                Self::Packed(ref x) => x.$method($($arg),*),
            }
        }
    };
}

macro_rules! dispatch_matrix {
    () => {};
    ($vis:vis fn $method:ident $tt:tt $(-> $ret:ty)?; $($tail:tt)*) => {
        $crate::macros::dispatch_matrix_inner! {
            $vis fn $method $tt $(-> $ret)*
        }
        $crate::macros::dispatch_matrix!{$($tail)*}
    };
}

pub(crate) use dispatch_matrix;
pub(crate) use dispatch_matrix_inner;
