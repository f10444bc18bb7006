//! Model-bound forms.
//!
//! Field parsing and type coercion are done by Rocket's `FromForm`, collected
//! through [`Contextual`]. This module adds what Rocket does not know about:
//! which model fields a form edits, their labels, help texts and widgets,
//! how they are grouped into fieldsets, and form-level (cross-field) cleaning.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use anyhow::anyhow;
use itertools::Itertools;
use rocket::form::{Context, Contextual};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::util::is_truthy;

/// Key used for errors that do not belong to a single field.
pub const NON_FIELD_ERRORS: &str = "__all__";

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Widget {
    TextInput,
    Textarea,
    NumberInput,
    CheckboxInput,
    Select,
    SelectMultiple,
    CheckboxSelectMultiple,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Char { max_length: usize },
    Text,
    PositiveInteger,
    Boolean,
    Choice(&'static [(&'static str, &'static str)]),
    MultipleChoice(&'static [(&'static str, &'static str)]),
    /// Choices are rows of another table, the form fills them in at runtime.
    ManyToMany,
}
impl FieldKind {
    fn default_widget(self) -> Widget {
        match self {
            FieldKind::Char { .. } => Widget::TextInput,
            FieldKind::Text => Widget::Textarea,
            FieldKind::PositiveInteger => Widget::NumberInput,
            FieldKind::Boolean => Widget::CheckboxInput,
            FieldKind::Choice(_) => Widget::Select,
            FieldKind::MultipleChoice(_) | FieldKind::ManyToMany => Widget::SelectMultiple,
        }
    }
    fn static_choices(self) -> &'static [(&'static str, &'static str)] {
        match self {
            FieldKind::Choice(choices) | FieldKind::MultipleChoice(choices) => choices,
            _ => &[],
        }
    }
    fn max_length(self) -> Option<usize> {
        match self {
            FieldKind::Char { max_length } => Some(max_length),
            _ => None,
        }
    }
}

/// Field metadata as declared on the model.
#[derive(Clone, Copy, Debug)]
pub struct ModelField {
    pub name: &'static str,
    pub verbose_name: &'static str,
    pub help_text: Option<&'static str>,
    pub kind: FieldKind,
    pub blank: bool,
}
impl ModelField {
    pub const fn new(name: &'static str, verbose_name: &'static str, kind: FieldKind) -> Self {
        Self { name, verbose_name, help_text: None, kind, blank: false }
    }
    pub const fn help(mut self, help_text: &'static str) -> Self {
        self.help_text = Some(help_text);
        self
    }
    pub const fn blank(mut self) -> Self {
        self.blank = true;
        self
    }
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

#[derive(Clone, Debug)]
pub struct FormField {
    pub name: &'static str,
    pub label: String,
    pub help_text: Option<String>,
    pub widget: Widget,
    pub required: bool,
    /// Maximum length in characters, not bytes.
    pub max_length: Option<usize>,
    pub choices: Vec<Choice>,
}

/// Form fields in form order.
#[derive(Clone, Debug, Default)]
pub struct Fields(Vec<FormField>);
impl Fields {
    pub fn get(&self, name: &str) -> Option<&FormField> {
        self.0.iter().find(|f| f.name == name)
    }
    pub fn get_mut(&mut self, name: &str) -> Option<&mut FormField> {
        self.0.iter_mut().find(|f| f.name == name)
    }
    pub fn field_mut(&mut self, name: &str) -> anyhow::Result<&mut FormField> {
        self.get_mut(name).ok_or_else(|| anyhow!("Form has no field {name}"))
    }
    pub fn iter(&self) -> impl Iterator<Item = &FormField> {
        self.0.iter()
    }
    pub fn names(&self) -> Vec<&'static str> {
        self.0.iter().map(|f| f.name).collect()
    }
    /// Adds an error when `value` of a length limited field is too long.
    pub fn check_max_length(&self, name: &str, value: &str, errors: &mut FieldErrors) {
        let Some(max_length) = self.get(name).and_then(|f| f.max_length) else {
            return;
        };
        let length = value.chars().count();
        if length > max_length {
            errors.add(name, format!("Ensure this value has at most {max_length} characters (it has {length})."));
        }
    }
}

/// Derives form fields for `names` from the model declaration, in the order given.
pub fn fields_for_model(model: &[ModelField], names: &[&'static str], widgets: &[(&str, Widget)]) -> anyhow::Result<Fields> {
    let fields = names.iter().map(|&name| {
        let model_field = model.iter().find(|f| f.name == name)
            .ok_or_else(|| anyhow!("Unknown model field: {name}"))?;
        let widget = widgets.iter()
            .find(|(n, _)| *n == name)
            .map(|(_, w)| *w)
            .unwrap_or(model_field.kind.default_widget());
        let required = match model_field.kind {
            FieldKind::Boolean => false,
            _ => !model_field.blank,
        };
        Ok(FormField {
            name,
            label: model_field.verbose_name.to_string(),
            help_text: model_field.help_text.map(str::to_string),
            widget,
            required,
            max_length: model_field.kind.max_length(),
            choices: model_field.kind.static_choices().iter()
                .map(|&(value, label)| Choice { value: value.to_string(), label: label.to_string() })
                .collect(),
        })
    }).collect::<anyhow::Result<Vec<_>>>()?;
    Ok(Fields(fields))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutItem {
    Field(&'static str),
    Fieldset(String, Vec<&'static str>),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Layout(pub Vec<LayoutItem>);
impl Layout {
    /// Every field on its own, in form order.
    pub fn flat(fields: &Fields) -> Self {
        Self(fields.iter().map(|f| LayoutItem::Field(f.name)).collect())
    }
    pub fn field_names(&self) -> Vec<&'static str> {
        self.0.iter().flat_map(|item| match item {
            LayoutItem::Field(name) => vec![*name],
            LayoutItem::Fieldset(_, names) => names.clone(),
        }).collect()
    }
}

/// Validation errors keyed by field name.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);
impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
    #[cfg(test)]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
    pub fn from_context(context: &Context<'_>, names: &[&str]) -> Self {
        let mut errors = Self::default();
        for &name in names {
            for err in context.field_errors(name) {
                errors.add(name, err.to_string());
            }
        }
        errors
    }
}
impl Display for FieldErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = self.0.iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
            .join("; ");
        f.write_str(&s)
    }
}

/// Raw submitted (or initial) values, used to re-render a form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormData(BTreeMap<String, Vec<String>>);
impl FormData {
    pub fn from_context(context: &Context<'_>, names: &[&str]) -> Self {
        let data = names.iter()
            .map(|&name| (name.to_string(), context.field_values(name).map(str::to_string).collect::<Vec<_>>()))
            .filter(|(_, values)| !values.is_empty())
            .collect();
        Self(data)
    }
    /// Initial data from a record, null values are left out.
    pub fn from_serialize<T: Serialize>(value: &T) -> anyhow::Result<Self> {
        fn scalar(value: &Value) -> Option<String> {
            match value {
                Value::Bool(b) => Some(b.to_string()),
                Value::Number(n) => Some(n.to_string()),
                Value::String(s) => Some(s.clone()),
                _ => None,
            }
        }
        let Value::Object(map) = serde_json::to_value(value)? else {
            return Err(anyhow!("Form initial data must serialize to a map"));
        };
        let data = map.into_iter().filter_map(|(key, value)| {
            let values = match &value {
                Value::Array(items) => items.iter().filter_map(scalar).collect(),
                other => vec![scalar(other)?],
            };
            Some((key, values))
        }).collect();
        Ok(Self(data))
    }
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(String::as_str)
    }
    pub fn values(&self, name: &str) -> &[String] {
        self.0.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A form submission after field-level parsing.
#[derive(Debug)]
pub struct BoundForm<T> {
    pub values: Option<T>,
    pub data: FormData,
    pub errors: FieldErrors,
}
impl<T> BoundForm<T> {
    pub fn from_contextual(form: Contextual<'_, T>, names: &[&str]) -> Self {
        let data = FormData::from_context(&form.context, names);
        let mut errors = FieldErrors::from_context(&form.context, names);
        if form.value.is_none() && errors.is_empty() {
            errors.add(NON_FIELD_ERRORS, "Invalid form submission.");
        }
        Self { values: form.value, data, errors }
    }
    pub fn is_valid(&self) -> bool {
        self.values.is_some() && self.errors.is_empty()
    }
}

/// Outcome of processing a form submission.
#[derive(Debug)]
pub enum Submission<T> {
    Saved(T),
    Invalid { data: FormData, errors: FieldErrors },
}

pub trait ModelForm {
    type Values;

    fn fields(&self) -> &Fields;

    fn layout(&self) -> Layout {
        Layout::flat(self.fields())
    }

    /// Form-level cleaning, runs only when every field parsed.
    fn clean(&self, _values: &mut Self::Values) -> Result<(), FieldErrors> {
        Ok(())
    }

    fn full_clean(&self, form: &mut BoundForm<Self::Values>) -> bool {
        if let Some(values) = form.values.as_mut() {
            if let Err(errors) = self.clean(values) {
                form.errors.merge(errors);
            }
        }
        form.is_valid()
    }

    fn render(&self, data: &FormData, errors: &FieldErrors) -> anyhow::Result<Vec<RenderedItem>> {
        render_layout(self.fields(), &self.layout(), data, errors)
    }
}

#[derive(Serialize, Debug)]
pub struct BoundChoice {
    pub value: String,
    pub label: String,
    pub checked: bool,
}

#[derive(Serialize, Debug)]
pub struct BoundField {
    pub name: &'static str,
    pub label: String,
    pub help_text: Option<String>,
    pub widget: Widget,
    pub required: bool,
    pub value: String,
    pub checked: bool,
    pub choices: Vec<BoundChoice>,
    pub errors: Vec<String>,
}
impl BoundField {
    fn new(field: &FormField, data: &FormData, errors: &FieldErrors) -> Self {
        let values = data.values(field.name);
        let value = data.value(field.name).unwrap_or_default().to_string();
        Self {
            name: field.name,
            label: field.label.clone(),
            help_text: field.help_text.clone(),
            widget: field.widget,
            required: field.required,
            checked: is_truthy(&value),
            value,
            choices: field.choices.iter().map(|c| BoundChoice {
                value: c.value.clone(),
                label: c.label.clone(),
                checked: values.contains(&c.value),
            }).collect(),
            errors: errors.get(field.name).to_vec(),
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum RenderedItem {
    Field { field: BoundField },
    Fieldset { legend: String, fields: Vec<BoundField> },
}

pub fn render_layout(fields: &Fields, layout: &Layout, data: &FormData, errors: &FieldErrors) -> anyhow::Result<Vec<RenderedItem>> {
    let laid_out = layout.field_names();
    if let Some(missing) = fields.iter().find(|f| !laid_out.contains(&f.name)) {
        return Err(anyhow!("Field {} is missing from the layout", missing.name));
    }
    let bind = |name: &str| {
        fields.get(name)
            .map(|f| BoundField::new(f, data, errors))
            .ok_or_else(|| anyhow!("Layout refers to unknown field {name}"))
    };
    layout.0.iter().map(|item| match item {
        LayoutItem::Field(name) => Ok(RenderedItem::Field { field: bind(*name)? }),
        LayoutItem::Fieldset(legend, names) => Ok(RenderedItem::Fieldset {
            legend: legend.clone(),
            fields: names.iter().map(|name| bind(*name)).collect::<anyhow::Result<Vec<_>>>()?,
        }),
    }).collect()
}
