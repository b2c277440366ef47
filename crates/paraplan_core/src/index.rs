//! Typed indices into the normalizer's arenas. Wrapping the raw `usize`
//! keeps node, vehicle and ride ids from being mixed up.

#[macro_export]
macro_rules! index_newtype {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(usize);

        impl $name {
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            pub const fn get(self) -> usize {
                self.0
            }
        }
    };
}
