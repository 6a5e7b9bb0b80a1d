#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

pub use vc_mapper as mapper;
pub use vc_ptr as ptr;
pub use vc_utils as utils;
