pub(crate) mod archive;
pub(crate) mod copy;
pub(crate) mod list;
pub(crate) mod protect;
pub(crate) mod shared;
