pub(crate) mod calculate;
pub(crate) mod flatten;
pub(crate) mod normalize;
