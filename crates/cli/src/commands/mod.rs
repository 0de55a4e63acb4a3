pub(crate) mod bootstrap;
pub(crate) mod links;
pub(crate) mod serve;
pub(crate) mod session;
