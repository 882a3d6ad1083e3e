pub trait IntUid: Copy + Eq + Ord {
    type Raw;
    fn new() -> Self;
    fn raw(&self) -> Self::Raw;
}

#[macro_export(local_inner_macros)]
macro_rules! _impl_define_uint_id_type {
    ($name:ident, $type:ty, $atomic_type:ty) => {
        #[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, Ord, PartialOrd)]
        pub struct $name($type);

        impl crate::IntUid for $name {
            type Raw = $type;

            fn new() -> Self {
                static NEXT_ID: $atomic_type = <$atomic_type>::new(0);
                return Self(NEXT_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed))
            }

            fn raw(&self) -> Self::Raw {
                return self.0
            }
        }
    }
}

#[macro_export]
macro_rules! define_u32_id_type { ($name:ident) => { _impl_define_uint_id_type!{$name, u32, std::sync::atomic::AtomicU32} } }
