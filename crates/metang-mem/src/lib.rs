//! `metang` memory infrastructure
//!
//! This crate provides the pieces every `metang` pass is built on:
//!
//! - **Arena**: a single growable byte region handing out disjoint,
//!   aligned [`Span`]s by bumping one offset
//! - **String slices**: the non-owning [`Str`] view with zero-copy
//!   splitting and trimming, casing into caller buffers, and cloning into an
//!   arena
//! - **String lists**: [`StrList`], an ordered list whose nodes live in the
//!   arena they were appended to
//!
//! Arena failures travel through two channels. A request made with
//! [`AllocFlags::SOFT_FAIL`] reports exhaustion as `Ok(None)`; everything
//! else reports it as `Err(ArenaError)`, to be propagated with `?` up to the
//! one recovery point of the pass (see [`ArenaFactory::run`]).

pub mod arena;
pub mod error;
pub mod factory;
pub mod list;
pub mod strbuf;

pub use arena::{AllocFlags, Arena, ArenaStats, Span};
pub use error::{ArenaError, Result};
pub use factory::ArenaFactory;
pub use list::StrList;
pub use strbuf::{Case, ParseIntError, Str, StrPair};
