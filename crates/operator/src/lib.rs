/*
 * 5D Labs NamespaceLabel Operator - Namespace Label Reconciliation
 * Copyright (C) 2025 5D Labs
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published
 * by the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 */

#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc, clippy::doc_markdown)]

//! NamespaceLabel operator core library
//!
//! Users declare desired namespace labels through the namespaced `NamespaceLabel`
//! custom resource. Two controllers keep the live Namespace objects converged:
//!
//! - The `NamespaceLabel` controller collapses fine-grained resource changes into
//!   namespace-granularity triggers on an in-process bus (fan-in).
//! - The Namespace controller consumes those triggers, lists every
//!   `NamespaceLabel` in the namespace, merges their label sets deterministically
//!   and full-replaces the namespace's labels.
//!
//! A validating admission webhook rejects `NamespaceLabel` objects that use
//! blacklisted label keys before they are ever persisted.

pub mod config;
pub mod controllers;
pub mod crds;
pub mod labels;
pub mod trigger;
pub mod webhook;

// Re-export commonly used types
pub use config::OperatorConfig;
pub use controllers::{run_controllers, Context, Error, Result};
pub use crds::{NamespaceLabel, NamespaceLabelSpec};
pub use labels::{forbidden_key, is_blacklisted, merge, LabelSet};
pub use trigger::{trigger_bus, TriggerBus};
