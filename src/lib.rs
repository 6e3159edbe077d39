//! Task Lists
//!
//! Task lists grouped in folders, each holding a tree of tasks, kept in
//! sync with a remote store. The engines are UI-agnostic; `app` and
//! `components` render them with Leptos.

pub mod api;
pub mod app;
pub mod components;
pub mod config;
pub mod context;
pub mod edit;
pub mod engine;
pub mod lists;
pub mod models;
pub mod overview;
pub mod tasks;
pub mod tree;

#[cfg(test)]
mod testing;
