//! JSON-Schema form adapter.
//!
//! Turns JSON-Schema documents carrying `x-jsf-*` presentation keys into
//! renderable [`Field`] lists, evaluates conditional visibility, validates
//! values and converts them to and from the API payload shape.

mod conditions;
pub mod error;
pub mod field;
pub mod form;
pub mod modify;
pub mod money;
pub mod schema;
pub mod transform;
pub mod validation;

pub use error::JsfError;
pub use field::{walk_fields, Field, FieldOption, InputType};
pub use form::{build_form, Form, FormMeta};
pub use modify::{FieldPatch, JsfModify, ModifyOutcome};
pub use money::{format_money, from_minor_units, to_minor_units};
pub use schema::{SchemaDocument, X_JSF_ORDER, X_JSF_PRESENTATION};
pub use transform::{prune_empty, FieldTransformer, FieldValues};
pub use validation::{validate_values, REQUIRED_MESSAGE};
