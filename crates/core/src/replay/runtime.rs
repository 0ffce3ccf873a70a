//! In-memory command specification model the replayer builds

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;

use crate::model::ScopeType;
use crate::synth::ir::Accessor;

pub type ObjectRef = Rc<RefCell<Object>>;

#[derive(Debug, Clone)]
pub enum Slot {
    Value(Value),
    Object(ObjectRef),
    /// Injected specification, by command name
    Spec(String),
}

/// A bound instance: its type and named member slots
#[derive(Debug, Clone, Default)]
pub struct Object {
    pub type_name: String,
    slots: BTreeMap<String, Slot>,
}

impl Object {
    pub fn new_ref(type_name: impl Into<String>) -> ObjectRef {
        Rc::new(RefCell::new(Object {
            type_name: type_name.into(),
            slots: BTreeMap::new(),
        }))
    }

    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.get(name)
    }

    pub fn set_slot(&mut self, name: impl Into<String>, slot: Slot) -> Option<Slot> {
        self.slots.insert(name.into(), slot)
    }

    pub fn value(&self, name: &str) -> Value {
        match self.slots.get(name) {
            Some(Slot::Value(value)) => value.clone(),
            Some(Slot::Spec(name)) => Value::String(name.clone()),
            _ => Value::Null,
        }
    }

    pub fn object(&self, name: &str) -> Option<ObjectRef> {
        match self.slots.get(name) {
            Some(Slot::Object(object)) => Some(object.clone()),
            _ => None,
        }
    }
}

/// Slot an accessor reads or writes. Bean-style methods map onto their
/// property: `getCount`, `setCount` and `isCount` all address `count`.
pub fn property_name(accessor: &Accessor) -> String {
    match accessor {
        Accessor::Field { name } => name.clone(),
        Accessor::Method { name } => {
            for prefix in ["get_", "set_", "is_", "get", "set", "is"] {
                if let Some(rest) = name.strip_prefix(prefix) {
                    let mut chars = rest.chars();
                    if let Some(first) = chars.next()
                        && (prefix.ends_with('_') || first.is_ascii_uppercase())
                    {
                        return first.to_ascii_lowercase().to_string() + chars.as_str();
                    }
                }
            }
            name.clone()
        }
    }
}

/// Getter/setter pair bound to one member of an instance
#[derive(Debug, Clone)]
pub struct ArgBinding {
    pub object: ObjectRef,
    pub getter: Option<Accessor>,
    pub setter: Option<Accessor>,
    pub previous: Option<Accessor>,
}

impl ArgBinding {
    pub fn get(&self) -> Value {
        match &self.getter {
            Some(getter) => self.object.borrow().value(&property_name(getter)),
            None => Value::Null,
        }
    }

    /// Store `value` and hand back what it replaced
    pub fn set(&self, value: Value) -> Value {
        let previous = match &self.previous {
            Some(previous) => self.object.borrow().value(&property_name(previous)),
            None => Value::Null,
        };
        if let Some(setter) = &self.setter {
            self.object
                .borrow_mut()
                .set_slot(property_name(setter), Slot::Value(value));
        }
        previous
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ArgSpec {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    pub arity: String,
    pub description: Vec<String>,
    pub type_name: String,
    pub auxiliary_types: Vec<String>,
    pub default_value: Option<String>,
    pub has_initial_value: bool,
    pub hidden: bool,
    pub scope: ScopeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_value: Option<String>,
    pub negatable: bool,
    pub usage_help: bool,
    pub map_fallback_value: Option<String>,
    pub preprocessor: Option<String>,
    pub parameter_consumer: Option<String>,
    #[serde(skip)]
    pub binding: Option<ArgBinding>,
}

impl ArgSpec {
    pub fn is_option(&self) -> bool {
        !self.names.is_empty()
    }

    pub fn shares_name_with(&self, other: &ArgSpec) -> bool {
        self.names.iter().any(|name| other.names.contains(name))
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupSpec {
    pub exclusive: bool,
    pub multiplicity: Option<String>,
    pub heading: Option<String>,
    pub args: Vec<ArgSpec>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CommandSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub options: Vec<ArgSpec>,
    pub positionals: Vec<ArgSpec>,
    pub groups: Vec<GroupSpec>,
    pub mixins: Vec<(String, CommandSpec)>,
    pub subcommands: Vec<(String, CommandSpec)>,
    #[serde(skip)]
    pub instance: Option<ObjectRef>,
    #[serde(skip)]
    parent_injections: Vec<(ObjectRef, String)>,
}

impl CommandSpec {
    pub fn wrap(instance: ObjectRef, method: Option<String>) -> Self {
        CommandSpec {
            instance: Some(instance),
            method,
            ..Default::default()
        }
    }

    /// Options sharing a name with an earlier one replace it
    pub fn add_option(&mut self, option: ArgSpec) {
        match self.options.iter().position(|o| o.shares_name_with(&option)) {
            Some(i) => self.options[i] = option,
            None => self.options.push(option),
        }
    }

    pub fn add_positional(&mut self, positional: ArgSpec) {
        self.positionals.push(positional);
    }

    pub fn add_group(&mut self, group: GroupSpec) {
        self.groups.push(group);
    }

    pub fn add_mixin(&mut self, name: impl Into<String>, mixin: CommandSpec) {
        self.mixins.push((name.into(), mixin));
    }

    pub fn add_parent_injection(&mut self, object: ObjectRef, field: impl Into<String>) {
        self.parent_injections.push((object, field.into()));
    }

    /// Register a subcommand, resolving its parent-command injections
    pub fn add_subcommand(&mut self, name: impl Into<String>, subcommand: CommandSpec) {
        for (object, field) in &subcommand.parent_injections {
            object
                .borrow_mut()
                .set_slot(field.clone(), Slot::Spec(self.name.clone()));
        }
        self.subcommands.push((name.into(), subcommand));
    }

    pub fn option(&self, name: &str) -> Option<&ArgSpec> {
        self.options
            .iter()
            .find(|o| o.names.iter().any(|n| n == name))
    }

    pub fn subcommand(&self, name: &str) -> Option<&CommandSpec> {
        self.subcommands
            .iter()
            .find(|(sub, _)| sub == name)
            .map(|(_, spec)| spec)
    }

    pub fn mixin(&self, name: &str) -> Option<&CommandSpec> {
        self.mixins
            .iter()
            .find(|(mixin, _)| mixin == name)
            .map(|(_, spec)| spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_names() {
        let method = |name: &str| Accessor::Method {
            name: name.to_string(),
        };
        assert_eq!(property_name(&method("getCount")), "count");
        assert_eq!(property_name(&method("set_count")), "count");
        assert_eq!(property_name(&method("isVerbose")), "verbose");
        assert_eq!(property_name(&method("settings")), "settings");
        assert_eq!(
            property_name(&Accessor::Field {
                name: "count".to_string()
            }),
            "count"
        );
    }

    #[test]
    fn test_setter_returns_previous_value() {
        let object = Object::new_ref("App");
        let field = Accessor::Field {
            name: "count".to_string(),
        };
        let binding = ArgBinding {
            object: object.clone(),
            getter: Some(field.clone()),
            setter: Some(field.clone()),
            previous: Some(field),
        };

        assert_eq!(binding.set(Value::from(1)), Value::Null);
        assert_eq!(binding.set(Value::from(2)), Value::from(1));
        assert_eq!(binding.get(), Value::from(2));
    }

    #[test]
    fn test_option_with_shared_name_replaces_earlier() {
        let mut spec = CommandSpec::default();
        spec.add_option(ArgSpec {
            names: vec!["-x".to_string()],
            default_value: Some("X".to_string()),
            ..Default::default()
        });
        spec.add_option(ArgSpec {
            names: vec!["-x".to_string(), "--ex".to_string()],
            default_value: Some("Y".to_string()),
            ..Default::default()
        });

        assert_eq!(spec.options.len(), 1);
        assert_eq!(spec.option("-x").and_then(|o| o.default_value.as_deref()), Some("Y"));
    }

    #[test]
    fn test_parent_injection_resolves_on_registration() {
        let child = Object::new_ref("Child");
        let mut sub = CommandSpec::wrap(child.clone(), None);
        sub.name = "child".to_string();
        sub.add_parent_injection(child.clone(), "parent");

        let mut root = CommandSpec::wrap(Object::new_ref("Root"), None);
        root.name = "root".to_string();
        root.add_subcommand("child", sub);

        assert_eq!(child.borrow().value("parent"), Value::from("root"));
    }
}
