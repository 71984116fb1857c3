//! Interaction plumbing shared by chart selectors.
//!
//! A selector keeps three asynchronously created resources consistent: the mark views of
//! its figure, the scale views its selection is expressed in, and the selection stored on
//! its host model. [`selector::SelectorView`] owns that coordination. Concrete selectors
//! implement [`selector::Selector`] and pick a scale strategy from [`binding`].

pub mod binding;
pub mod config;
pub mod dates;
pub mod error;
pub mod event;
pub mod figure;
pub mod marks;
pub mod model;
pub mod prelude;
pub mod scale;
pub mod selector;
