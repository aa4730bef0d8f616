//! ElasticBLAST.

#[cfg(feature = "config")]
#[doc(inline)]
pub use elastic_blast_config as config;
#[cfg(feature = "config")]
#[doc(inline)]
pub use elastic_blast_config::Config;
