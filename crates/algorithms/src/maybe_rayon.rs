//! Row-parallel execution that degrades to plain iteration.
//!
//! With the `parallel` feature the algorithms iterate rows through rayon.
//! Without it, `into_par_iter()` resolves to `into_iter()` and the rest of
//! each chain (`map`, `flat_map`, `collect`) uses the std `Iterator` methods,
//! so the grid code is written once.
#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;
