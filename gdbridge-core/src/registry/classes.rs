/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Class registry: class names to engine tags, method binds, parent chains and extension class info.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::builtin::StringName;
use crate::log::godot_warn;
use crate::meta::error::{BridgeError, ErrorKind};
use crate::meta::{return_type_from_schema, ClassName, MethodInfo, ReturnOwnership};
use crate::registry::{ExtensionClassInfo, HandleKind};
use crate::sys;
use sys::interface_fn;

/// Engine classes every bridge needs, in schema form: the object root and the refcounted root with its refcount protocol.
pub const CORE_API_JSON: &str = r#"{
    "classes": [
        {
            "name": "Object",
            "is_refcounted": false,
            "is_instantiable": true,
            "methods": [
                { "name": "get_class", "hash": 201670096 },
                { "name": "is_class", "hash": 3927539163 },
                { "name": "set", "hash": 3776071444 },
                { "name": "get", "hash": 2760726917 },
                { "name": "notification", "hash": 4023243586 },
                { "name": "to_string", "hash": 2841200299 },
                { "name": "connect", "hash": 1518946055 },
                { "name": "emit_signal", "hash": 4047867050, "is_vararg": true },
                { "name": "get_instance_id", "hash": 3905245786 }
            ],
            "signals": [ { "name": "script_changed" }, { "name": "property_list_changed" } ]
        },
        {
            "name": "RefCounted",
            "inherits": "Object",
            "is_refcounted": true,
            "is_instantiable": true,
            "methods": [
                { "name": "init_ref", "hash": 2240911060 },
                { "name": "reference", "hash": 2240911060 },
                { "name": "unreference", "hash": 2240911060 },
                { "name": "get_reference_count", "hash": 3905245786 }
            ]
        }
    ]
}"#;

/// Opaque engine class tag, used with `object_cast_to`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ClassTag(usize);

impl ClassTag {
    pub fn as_sys(self) -> *mut std::ffi::c_void {
        self.0 as *mut std::ffi::c_void
    }
}

/// Engine method bind, resolved once per `(class, method)`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct MethodBind(usize);

impl MethodBind {
    pub fn as_sys(self) -> sys::GDExtensionMethodBindPtr {
        self.0 as sys::GDExtensionMethodBindPtr
    }
}

/// Registry entry of one class.
#[derive(Clone, Debug)]
pub struct ClassEntry {
    pub name: ClassName,
    pub parent: Option<ClassName>,
    pub is_refcounted: bool,
    pub is_instantiable: bool,

    /// Explicit handle shape for wrappers of this class and its subclasses.
    pub handle: Option<HandleKind>,

    pub methods: HashMap<String, MethodInfo>,
    pub signals: Vec<String>,

    /// Set for host-defined subclasses.
    pub extension: Option<Arc<ExtensionClassInfo>>,
}

impl ClassEntry {
    pub fn new(name: &str, parent: Option<&str>) -> Self {
        Self {
            name: ClassName::new(name),
            parent: parent.map(ClassName::new),
            is_refcounted: false,
            is_instantiable: true,
            handle: None,
            methods: HashMap::new(),
            signals: Vec::new(),
            extension: None,
        }
    }

    pub fn with_refcounted(mut self, is_refcounted: bool) -> Self {
        self.is_refcounted = is_refcounted;
        self
    }

    pub fn with_handle(mut self, kind: HandleKind) -> Self {
        self.handle = Some(kind);
        self
    }

    pub fn with_method(mut self, method: MethodInfo) -> Self {
        self.methods.insert(method.name.clone(), method);
        self
    }

    pub fn with_signal(mut self, signal: &str) -> Self {
        self.signals.push(signal.to_string());
        self
    }

    pub fn is_extension(&self) -> bool {
        self.extension.is_some()
    }
}

/// Maps class names to their entries and memoizes what the engine resolves for them (tags, method binds).
///
/// Populated during init; afterwards reads dominate. No lock is held across an engine call.
pub struct ClassRegistry {
    entries: RwLock<HashMap<ClassName, Arc<ClassEntry>>>,
    tags: DashMap<ClassName, ClassTag>,
    binds: DashMap<(ClassName, String), (MethodBind, MethodInfo)>,
}

impl ClassRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            tags: DashMap::new(),
            binds: DashMap::new(),
        }
    }

    /// Registry pre-populated with `Object` and `RefCounted`.
    pub fn with_core_classes() -> Self {
        let registry = Self::new();
        if let Err(err) = registry.load_api_json(CORE_API_JSON) {
            crate::fatal!("built-in class schema is broken: {err}");
        }
        registry
    }

    /// Adds or replaces a class. Replacing logs a diagnostic and returns the previous entry; the last registration wins.
    ///
    /// Fails with [`ErrorKind::InvalidSchema`] if the new parent link would close a cycle.
    pub fn register(&self, entry: ClassEntry) -> Result<Option<Arc<ClassEntry>>, BridgeError> {
        let mut previous = self.register_all(vec![entry])?;
        Ok(previous.pop().flatten())
    }

    /// Registers `batch` atomically: either every entry is added or, on a parent cycle, none.
    fn register_all(&self, batch: Vec<ClassEntry>) -> Result<Vec<Option<Arc<ClassEntry>>>, BridgeError> {
        let mut entries = self.entries.write();

        let pending: HashMap<&str, Option<&str>> = batch
            .iter()
            .map(|entry| (entry.name.as_str(), entry.parent.as_ref().map(ClassName::as_str)))
            .collect();
        for entry in &batch {
            check_acyclic(&entries, &pending, entry.name.as_str())?;
        }
        drop(pending);

        let replaced: Vec<_> = batch
            .into_iter()
            .map(|entry| {
                let name = entry.name.clone();
                let previous = entries.insert(name.clone(), Arc::new(entry));
                (name, previous)
            })
            .collect();
        drop(entries);

        for (name, previous) in &replaced {
            if previous.is_some() {
                let err = BridgeError::new(ErrorKind::ReentrantRegister, name.as_str());
                godot_warn!("{err}; last registration wins");

                self.tags.remove(name);
                self.binds.retain(|(class, _), _| class != name);
            }
        }

        Ok(replaced.into_iter().map(|(_, previous)| previous).collect())
    }

    pub fn unregister(&self, name: &str) -> Option<Arc<ClassEntry>> {
        let removed = self.entries.write().remove(name);
        self.tags.remove(name);
        self.binds.retain(|(class, _), _| class.as_str() != name);
        removed
    }

    pub fn get(&self, name: &str) -> Option<Arc<ClassEntry>> {
        self.entries.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries from `name` up to the root. Stops at the first unknown class.
    ///
    /// Registration rejects cycles, so a cyclic chain here is a broken invariant.
    pub fn ancestry(&self, name: &str) -> Vec<Arc<ClassEntry>> {
        let entries = self.entries.read();
        let mut chain = Vec::new();
        let mut current = entries.get(name).cloned();

        while let Some(entry) = current {
            if chain.len() > entries.len() {
                drop(entries);
                crate::fatal!("class hierarchy of {name} contains a cycle");
            }

            current = entry.parent.as_ref().and_then(|parent| entries.get(parent).cloned());
            chain.push(entry);
        }

        chain
    }

    /// Whether `derived` is `base` or one of its subclasses, according to registered parent chains.
    pub fn inherits(&self, derived: &str, base: &str) -> bool {
        self.ancestry(derived).iter().any(|entry| entry.name.as_str() == base)
    }

    pub fn is_refcounted(&self, name: &str) -> bool {
        self.ancestry(name).iter().any(|entry| entry.is_refcounted)
    }

    /// Nearest extension class info in the chain of `name`.
    pub fn extension_info(&self, name: &str) -> Option<Arc<ExtensionClassInfo>> {
        self.ancestry(name).into_iter().find_map(|entry| entry.extension.clone())
    }

    /// Handle shape for wrappers of `name`.
    ///
    /// An explicit kind in the class chain wins. Otherwise refcounted classes use plain handles (the host reference keeps
    /// them alive), and all others follow `checked_default`.
    pub fn handle_kind(&self, name: &str, checked_default: bool) -> HandleKind {
        let chain = self.ancestry(name);

        if let Some(kind) = chain.iter().find_map(|entry| entry.handle) {
            kind
        } else if chain.iter().any(|entry| entry.is_refcounted) || !checked_default {
            HandleKind::Plain
        } else {
            HandleKind::Checked
        }
    }

    /// Finds `method` in the chain of `class`; returns the declaring class with the method's metadata.
    pub fn method_info(&self, class: &str, method: &str) -> Option<(ClassName, MethodInfo)> {
        self.ancestry(class).into_iter().find_map(|entry| {
            entry
                .methods
                .get(method)
                .map(|info| (entry.name.clone(), info.clone()))
        })
    }

    /// Virtual methods declared along the chain of `class`, nearest declaration first, with their return kinds.
    pub fn virtual_methods(&self, class: &str) -> Vec<(String, Option<sys::VariantType>)> {
        let mut seen = HashSet::new();
        let mut virtuals = Vec::new();

        for entry in self.ancestry(class) {
            for info in entry.methods.values().filter(|info| info.is_virtual) {
                if seen.insert(info.name.clone()) {
                    virtuals.push((info.name.clone(), info.return_type));
                }
            }
        }

        virtuals
    }

    /// Engine class tag of `name`, memoized.
    pub fn tag(&self, name: &str) -> Result<ClassTag, BridgeError> {
        if let Some(tag) = self.tags.get(name).map(|tag| *tag) {
            return Ok(tag);
        }

        let sname = StringName::from(name);
        // SAFETY: the engine accepts any class name and returns null for unknown ones.
        let tag = unsafe { interface_fn!(classdb_get_class_tag)(sname.string_sys()) };
        if tag.is_null() {
            return Err(BridgeError::engine(format!("engine has no class tag for {name}")));
        }

        let tag = ClassTag(tag as usize);
        self.tags.insert(ClassName::new(name), tag);
        Ok(tag)
    }

    /// Method bind of `method`, looked up through the parent chain of `class` and memoized per `(class, method)`.
    pub fn method_bind(&self, class: &str, method: &str) -> Result<(MethodBind, MethodInfo), BridgeError> {
        let key = (ClassName::new(class), method.to_string());
        if let Some(found) = self.binds.get(&key).map(|entry| entry.clone()) {
            return Ok(found);
        }

        let (declaring_class, info) = self.method_info(class, method).ok_or_else(|| {
            BridgeError::engine(format!("method {class}::{method} is not registered"))
        })?;

        let class_sname = declaring_class.to_string_name();
        let method_sname = StringName::from(method);

        // SAFETY: both names are live for the call; the engine returns null for unknown methods or hash mismatches.
        let bind = unsafe {
            interface_fn!(classdb_get_method_bind)(class_sname.string_sys(), method_sname.string_sys(), info.hash)
        };
        if bind.is_null() {
            return Err(BridgeError::engine(format!(
                "engine has no method bind for {declaring_class}::{method} (hash {})",
                info.hash
            )));
        }

        let found = (MethodBind(bind as usize), info);
        self.binds.insert(key, found.clone());
        Ok(found)
    }

    /// Engine-side dynamic cast of the object at `ptr` to `target`. Null results are reported as [`ErrorKind::CastFailed`].
    pub fn cast_ptr(
        &self,
        ptr: sys::GDExtensionObjectPtr,
        target: &str,
    ) -> Result<sys::GDExtensionObjectPtr, BridgeError> {
        let tag = self.tag(target)?;

        // SAFETY: callers pass a resolved (live) object pointer.
        let cast = unsafe { interface_fn!(object_cast_to)(ptr, tag.as_sys()) };
        if cast.is_null() {
            Err(BridgeError::new(ErrorKind::CastFailed, format!("object at {ptr:?} is not a {target}")))
        } else {
            Ok(cast)
        }
    }

    /// Asks the engine to allocate an object of class `name`. Does not touch reference counts.
    pub fn construct_raw(&self, name: &str) -> Result<sys::GDExtensionObjectPtr, BridgeError> {
        if let Some(entry) = self.get(name) {
            if !entry.is_instantiable {
                return Err(BridgeError::engine(format!("class {name} is not instantiable")));
            }
        }

        let sname = StringName::from(name);
        // SAFETY: the engine returns null for unknown or abstract classes.
        let ptr = unsafe { interface_fn!(classdb_construct_object)(sname.string_sys()) };
        if ptr.is_null() {
            Err(BridgeError::engine(format!("engine could not construct {name}")))
        } else {
            Ok(ptr)
        }
    }

    /// Registers every class of an `extension_api.json`-shaped document. Returns the number of classes read.
    ///
    /// Classes are registered in document order; a class may name a parent that appears later.
    pub fn load_api_json(&self, json: &str) -> Result<usize, BridgeError> {
        let document: Value = serde_json::from_str(json).map_err(|err| schema_error(format!("not valid JSON: {err}")))?;

        let classes = document
            .get("classes")
            .and_then(Value::as_array)
            .ok_or_else(|| schema_error("missing array 'classes'"))?;

        let entries = classes.iter().map(parse_class).collect::<Result<Vec<_>, _>>()?;
        let count = entries.len();
        self.register_all(entries)?;

        Ok(count)
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Schema parsing

fn schema_error(context: impl Into<String>) -> BridgeError {
    BridgeError::new(ErrorKind::InvalidSchema, context)
}

/// Walks the parent chain of `start`, with `pending` entries shadowing registered ones.
fn check_acyclic<'a>(
    entries: &'a HashMap<ClassName, Arc<ClassEntry>>,
    pending: &HashMap<&'a str, Option<&'a str>>,
    start: &'a str,
) -> Result<(), BridgeError> {
    let mut seen = HashSet::new();
    let mut current = Some(start);

    while let Some(name) = current {
        if !seen.insert(name) {
            return Err(schema_error(format!("class hierarchy of {start} contains a cycle through {name}")));
        }

        current = match pending.get(name) {
            Some(parent) => *parent,
            None => entries.get(name).and_then(|entry| entry.parent.as_ref()).map(ClassName::as_str),
        };
    }

    Ok(())
}

fn str_field<'a>(object: &'a Map<String, Value>, key: &str, owner: &str) -> Result<&'a str, BridgeError> {
    object
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| schema_error(format!("{owner}: missing string '{key}'")))
}

fn bool_field(object: &Map<String, Value>, key: &str, default: bool, owner: &str) -> Result<bool, BridgeError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(value)) => Ok(*value),
        Some(_) => Err(schema_error(format!("{owner}: '{key}' must be a boolean"))),
    }
}

fn parse_class(value: &Value) -> Result<ClassEntry, BridgeError> {
    let object = value
        .as_object()
        .ok_or_else(|| schema_error("class entry is not an object"))?;

    let name = str_field(object, "name", "class")?;
    let parent = match object.get("inherits") {
        None | Some(Value::Null) => None,
        Some(Value::String(parent)) => Some(parent.as_str()),
        Some(_) => return Err(schema_error(format!("{name}: 'inherits' must be a string"))),
    };

    let mut entry = ClassEntry::new(name, parent);
    entry.is_refcounted = bool_field(object, "is_refcounted", false, name)?;
    entry.is_instantiable = bool_field(object, "is_instantiable", true, name)?;

    entry.handle = match object.get("handle").and_then(Value::as_str) {
        None => None,
        Some("plain") => Some(HandleKind::Plain),
        Some("checked") => Some(HandleKind::Checked),
        Some(other) => return Err(schema_error(format!("{name}: unknown handle kind '{other}'"))),
    };

    if let Some(methods) = object.get("methods").and_then(Value::as_array) {
        for method in methods {
            let info = parse_method(method, name)?;
            entry.methods.insert(info.name.clone(), info);
        }
    }

    if let Some(signals) = object.get("signals").and_then(Value::as_array) {
        for signal in signals {
            let signal_name = match signal {
                Value::String(signal_name) => signal_name.as_str(),
                Value::Object(fields) => str_field(fields, "name", name)?,
                _ => return Err(schema_error(format!("{name}: malformed signal"))),
            };
            entry.signals.push(signal_name.to_string());
        }
    }

    Ok(entry)
}

fn parse_method(value: &Value, class: &str) -> Result<MethodInfo, BridgeError> {
    let object = value
        .as_object()
        .ok_or_else(|| schema_error(format!("{class}: method entry is not an object")))?;

    let name = str_field(object, "name", class)?;
    let owner = format!("{class}::{name}");

    // Virtual methods have no bind and may omit the hash.
    let is_virtual = bool_field(object, "is_virtual", false, &owner)?;
    let hash = match object.get("hash") {
        Some(hash) => hash
            .as_i64()
            .ok_or_else(|| schema_error(format!("{owner}: 'hash' must be an integer")))?,
        None if is_virtual => 0,
        None => return Err(schema_error(format!("{owner}: missing 'hash'"))),
    };

    let return_ownership = match object.get("return_ownership").and_then(Value::as_str) {
        None => ReturnOwnership::default(),
        Some(spelling) => ReturnOwnership::from_schema(spelling)
            .ok_or_else(|| schema_error(format!("{owner}: unknown return ownership '{spelling}'")))?,
    };

    // `"return_value": { "type": "int" }`; absent for void methods.
    let return_type = match object.get("return_value") {
        None => None,
        Some(value) => {
            let spelling = value
                .get("type")
                .and_then(Value::as_str)
                .ok_or_else(|| schema_error(format!("{owner}: 'return_value' needs a string 'type'")))?;
            return_type_from_schema(spelling)
        }
    };

    let mut info = MethodInfo::new(name, hash)
        .with_return_ownership(return_ownership)
        .with_return_type(return_type);
    info.is_virtual = is_virtual;
    info.is_vararg = bool_field(object, "is_vararg", false, &owner)?;

    Ok(info)
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_schema_loads() {
        let registry = ClassRegistry::with_core_classes();
        assert_eq!(registry.len(), 2);

        assert!(registry.inherits("RefCounted", "Object"));
        assert!(!registry.inherits("Object", "RefCounted"));
        assert!(registry.is_refcounted("RefCounted"));

        let (declaring, info) = registry.method_info("RefCounted", "get_class").unwrap();
        assert_eq!(declaring.as_str(), "Object");
        assert_eq!(info.hash, 201670096);
        assert!(registry.method_info("Object", "emit_signal").unwrap().1.is_vararg);
    }

    #[test]
    fn parent_may_come_later() {
        let registry = ClassRegistry::new();
        let json = r#"{ "classes": [
            { "name": "Container", "inherits": "Control", "handle": "checked",
              "methods": [ { "name": "get_tab", "hash": 5, "return_ownership": "lifetime_bound" } ] },
            { "name": "Control", "inherits": "Node" },
            { "name": "Node", "inherits": "Object" }
        ] }"#;

        assert_eq!(registry.load_api_json(CORE_API_JSON).unwrap(), 2);
        assert_eq!(registry.load_api_json(json).unwrap(), 3);

        let chain: Vec<_> = registry.ancestry("Container").iter().map(|e| e.name.to_string()).collect();
        assert_eq!(chain, ["Container", "Control", "Node", "Object"]);

        let (_, info) = registry.method_info("Container", "get_tab").unwrap();
        assert_eq!(info.return_ownership, ReturnOwnership::LifetimeBound);
    }

    #[test]
    fn handle_kind_resolution() {
        let registry = ClassRegistry::with_core_classes();
        registry.register(ClassEntry::new("Node", Some("Object"))).unwrap();
        registry.register(ClassEntry::new("Window", Some("Node")).with_handle(HandleKind::Plain)).unwrap();
        registry.register(ClassEntry::new("Resource", Some("RefCounted"))).unwrap();

        assert_eq!(registry.handle_kind("Node", false), HandleKind::Plain);
        assert_eq!(registry.handle_kind("Node", true), HandleKind::Checked);
        assert_eq!(registry.handle_kind("Window", true), HandleKind::Plain);
        assert_eq!(registry.handle_kind("Resource", true), HandleKind::Plain);
    }

    #[test]
    fn last_registration_wins() {
        let registry = ClassRegistry::new();
        assert!(registry.register(ClassEntry::new("Thing", None)).unwrap().is_none());

        let previous = registry.register(ClassEntry::new("Thing", None).with_refcounted(true)).unwrap();
        assert!(previous.is_some_and(|entry| !entry.is_refcounted));
        assert!(registry.get("Thing").unwrap().is_refcounted);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn malformed_schemas_are_rejected() {
        let registry = ClassRegistry::new();

        let cases = [
            "not json",
            r#"{ "types": [] }"#,
            r#"{ "classes": [ { "inherits": "Object" } ] }"#,
            r#"{ "classes": [ { "name": "A", "handle": "weak" } ] }"#,
            r#"{ "classes": [ { "name": "A", "methods": [ { "name": "f" } ] } ] }"#,
            r#"{ "classes": [ { "name": "A", "methods": [ { "name": "f", "hash": 1, "return_ownership": "owned" } ] } ] }"#,
            r#"{ "classes": [ { "name": "A", "inherits": "B" }, { "name": "B", "inherits": "A" } ] }"#,
            r#"{ "classes": [ { "name": "Loop", "inherits": "Loop" } ] }"#,
        ];

        for json in cases {
            let err = registry.load_api_json(json).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidSchema, "{json}");
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn cycles_are_rejected_before_registration() {
        let registry = ClassRegistry::with_core_classes();
        registry.register(ClassEntry::new("Node", Some("Object"))).unwrap();
        registry.register(ClassEntry::new("Control", Some("Node"))).unwrap();

        // Re-parenting `Node` below its own subclass.
        let err = registry.register(ClassEntry::new("Node", Some("Control"))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSchema);
        assert_eq!(registry.get("Node").unwrap().parent.as_ref().map(ClassName::as_str), Some("Object"));

        // A partly valid document registers nothing.
        let json = r#"{ "classes": [
            { "name": "Label", "inherits": "Control" },
            { "name": "A", "inherits": "B" },
            { "name": "B", "inherits": "A" }
        ] }"#;
        assert_eq!(registry.load_api_json(json).unwrap_err().kind(), ErrorKind::InvalidSchema);
        assert!(!registry.contains("Label"));
        assert!(!registry.contains("A"));

        assert!(registry.inherits("Control", "Object"));
        assert!(!registry.is_refcounted("Control"));
    }

    #[test]
    fn virtual_methods_need_no_hash() {
        let registry = ClassRegistry::new();
        let json = r#"{ "classes": [ { "name": "A", "methods": [ { "name": "_process", "is_virtual": true } ] } ] }"#;
        registry.load_api_json(json).unwrap();

        let (_, info) = registry.method_info("A", "_process").unwrap();
        assert!(info.is_virtual);
        assert_eq!(info.hash, 0);
        assert_eq!(info.return_type, None);
    }

    #[test]
    fn virtual_return_types_are_collected() {
        let registry = ClassRegistry::new();
        let json = r#"{ "classes": [
            { "name": "Base", "methods": [
                { "name": "_get_count", "is_virtual": true, "return_value": { "type": "int" } },
                { "name": "size", "hash": 5, "return_value": { "type": "int" } }
            ] },
            { "name": "Derived", "inherits": "Base", "methods": [
                { "name": "_query", "is_virtual": true, "return_value": { "type": "Dictionary" } }
            ] }
        ] }"#;
        registry.load_api_json(json).unwrap();

        let mut virtuals = registry.virtual_methods("Derived");
        virtuals.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            virtuals,
            vec![
                ("_get_count".to_string(), Some(sys::VariantType::Int)),
                ("_query".to_string(), Some(sys::VariantType::Dictionary)),
            ]
        );

        let bad = r#"{ "classes": [ { "name": "C", "methods": [ { "name": "_f", "is_virtual": true, "return_value": 3 } ] } ] }"#;
        assert_eq!(registry.load_api_json(bad).unwrap_err().kind(), ErrorKind::InvalidSchema);
    }
}
