//! Cache of backend variable objects.
//!
//! Every handle is indexed by its backend name and, when it has children, by a
//! reference number. Reference numbers come from a per-cache counter and stay
//! with a handle for its whole life, so a front end may keep them across value
//! updates.

pub mod handle;
pub mod value;

use crate::error::Error;
use crate::mi::record::{ResultRecord, Results, Value};
use crate::session::Executor;
use handle::{DisplayFormat, VarHandle, VarRef, VarScope};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::str::FromStr;
use value::{display_value, normalize};

/// Children inserted by a compiler to group members, they never get a handle.
const STRUCTURAL_MARKERS: [&str; 5] = [
    "public",
    "private",
    "protected",
    "<anonymous union>",
    "<anonymous struct>",
];

/// Types with this prefix belong to the implementation (vtable pointers, etc.).
const RESERVED_TYPE_PREFIX: &str = "__";

/// Decides which handles survive [`VarCache::sweep`].
pub trait RetentionPolicy {
    fn retain(&self, handle: &VarHandle) -> bool;
}

/// Keep everything, handles live as long as the session.
pub struct RetainAll;

impl RetentionPolicy for RetainAll {
    fn retain(&self, _: &VarHandle) -> bool {
        true
    }
}

/// One entry of a `-var-update` change list.
#[derive(Clone, Debug, PartialEq)]
pub struct VarChange {
    pub name: String,
    /// Display value, `None` if the backend reports no value (out of scope).
    pub value: Option<String>,
    pub in_scope: bool,
    pub type_changed: bool,
}

pub struct VarCache {
    handles: IndexMap<String, VarHandle>,
    by_ref: HashMap<VarRef, String>,
    /// `None` once the reference space is used up.
    next_ref: Option<NonZeroU32>,
}

impl Default for VarCache {
    fn default() -> Self {
        Self::new(1)
    }
}

fn field<'a>(results: &'a Results, name: &'static str) -> Result<&'a str, Error> {
    results.get_str(name).ok_or(Error::MissingField(name))
}

fn count(results: &Results, name: &str) -> u32 {
    results
        .get_str(name)
        .and_then(|n| n.parse().ok())
        .unwrap_or_default()
}

fn thread_id(results: &Results) -> Option<u32> {
    results.get_str("thread-id").and_then(|id| id.parse().ok())
}

/// Quote an expression as a c-string command argument.
fn quote(expression: &str) -> String {
    format!(
        "\"{}\"",
        expression.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

impl VarCache {
    /// Create an empty cache, reference numbers start at `reference_base`.
    pub fn new(reference_base: u32) -> Self {
        Self {
            handles: IndexMap::new(),
            by_ref: HashMap::new(),
            next_ref: Some(NonZeroU32::new(reference_base).unwrap_or(NonZeroU32::MIN)),
        }
    }

    pub fn by_name(&self, name: &str) -> Option<&VarHandle> {
        self.handles.get(name)
    }

    pub fn by_reference(&self, reference: u32) -> Option<&VarHandle> {
        let name = self.by_ref.get(&VarRef::new(reference)?)?;
        self.handles.get(name)
    }

    /// All handles in creation order.
    pub fn handles(&self) -> impl Iterator<Item = &VarHandle> {
        self.handles.values()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    fn allocate_ref(&mut self, name: &str) -> Result<VarRef, Error> {
        let next = self.next_ref.ok_or(Error::ReferencesExhausted)?;
        self.next_ref = next.checked_add(1);
        let reference = VarRef::from(next);
        self.by_ref.insert(reference, name.to_string());
        Ok(reference)
    }

    fn handle_mut(&mut self, name: &str) -> Result<&mut VarHandle, Error> {
        self.handles
            .get_mut(name)
            .ok_or_else(|| Error::VarNotFound(name.to_string()))
    }

    /// Insert or refresh a handle. An existing handle keeps its reference and
    /// display format.
    fn upsert(&mut self, mut handle: VarHandle) -> Result<VarHandle, Error> {
        let existing = self
            .handles
            .get(&handle.name)
            .map(|h| (h.reference, h.format));

        match existing {
            Some((reference, format)) => {
                handle.format = format;
                handle.reference = reference;
                if handle.child_count > 0 && reference.is_none() {
                    handle.reference = Some(self.allocate_ref(&handle.name)?);
                }
            }
            None => {
                if handle.child_count > 0 {
                    handle.reference = Some(self.allocate_ref(&handle.name)?);
                }
            }
        }

        self.handles.insert(handle.name.clone(), handle.clone());
        Ok(handle)
    }

    /// Create a variable object for `expression`.
    ///
    /// `name` is a requested object name, the backend may assign another one.
    pub fn create(
        &mut self,
        exec: &impl Executor,
        name: &str,
        expression: &str,
        scope: VarScope,
    ) -> Result<VarHandle, Error> {
        let record = exec.execute(&format!(
            "-var-create {}{name} * {}",
            scope.command_options(),
            quote(expression)
        ))?;
        let results = &record.results;

        let type_name = results.get_str("type").unwrap_or_default().to_string();
        let handle = VarHandle {
            name: results.get_str("name").unwrap_or(name).to_string(),
            display_name: expression.to_string(),
            value: normalize(
                results.get_str("value").unwrap_or_default(),
                DisplayFormat::Natural,
            ),
            type_name,
            reference: None,
            child_count: count(results, "numchild"),
            format: DisplayFormat::Natural,
            thread_id: thread_id(results).or(scope.thread),
        };

        crate::mib_debug!(target: "varobj", "created {} ({})", handle.name, handle.display_name);
        self.upsert(handle)
    }

    /// Enumerate children of a handle. Access specifier and anonymous aggregate
    /// nodes are replaced by their own children.
    pub fn list_children(
        &mut self,
        exec: &impl Executor,
        name: &str,
    ) -> Result<Vec<VarHandle>, Error> {
        let parent = self
            .by_name(name)
            .ok_or_else(|| Error::VarNotFound(name.to_string()))?;
        let thread = parent.thread_id;

        let mut children = vec![];
        self.collect_children(exec, name, thread, &mut children)?;
        Ok(children)
    }

    /// Same as [`VarCache::list_children`] but the parent is given by its
    /// reference number.
    pub fn list_children_by_ref(
        &mut self,
        exec: &impl Executor,
        reference: u32,
    ) -> Result<Vec<VarHandle>, Error> {
        let name = self
            .by_reference(reference)
            .map(|h| h.name.clone())
            .ok_or(Error::UnknownReference(reference))?;
        self.list_children(exec, &name)
    }

    fn collect_children(
        &mut self,
        exec: &impl Executor,
        parent: &str,
        thread: Option<u32>,
        out: &mut Vec<VarHandle>,
    ) -> Result<(), Error> {
        let record = exec.execute(&format!("-var-list-children --all-values {}", quote(parent)))?;

        let Some(children) = record.results.get("children").and_then(Value::as_list) else {
            return Ok(());
        };

        for child in children.values().filter_map(Value::as_tuple) {
            let child_name = field(child, "name")?;
            let exp = child.get_str("exp").unwrap_or(child_name);

            if STRUCTURAL_MARKERS.contains(&exp) {
                self.collect_children(exec, child_name, thread, out)?;
                continue;
            }

            let type_name = child.get_str("type").unwrap_or_default();
            if type_name.starts_with(RESERVED_TYPE_PREFIX) {
                continue;
            }

            let format = self
                .by_name(child_name)
                .map(|h| h.format)
                .unwrap_or_default();
            let raw = child.get_str("value").unwrap_or_default();
            let value = display_value(raw, format, type_name);

            let handle = VarHandle {
                name: child_name.to_string(),
                display_name: exp.to_string(),
                value,
                type_name: type_name.to_string(),
                reference: None,
                child_count: count(child, "numchild"),
                format,
                thread_id: thread_id(child).or(thread),
            };
            out.push(self.upsert(handle)?);
        }

        Ok(())
    }

    /// Change display format of a handle, return the new display value.
    pub fn set_format(
        &mut self,
        exec: &impl Executor,
        name: &str,
        format: DisplayFormat,
    ) -> Result<String, Error> {
        self.handle_mut(name)?;
        let record = exec.execute(&format!("-var-set-format {name} {format}"))?;

        // backend echoes the format it actually applied
        let format = match record.results.get_str("format") {
            Some(applied) => DisplayFormat::from_str(applied)
                .map_err(|_| Error::UnknownFormat(applied.to_string()))?,
            None => format,
        };
        let raw = field(&record.results, "value")?;

        let handle = self.handle_mut(name)?;
        handle.format = format;
        handle.value = display_value(raw, format, &handle.type_name);
        Ok(handle.value.clone())
    }

    /// Same as [`VarCache::set_format`], the format is given by its name.
    pub fn set_format_str(
        &mut self,
        exec: &impl Executor,
        name: &str,
        format: &str,
    ) -> Result<String, Error> {
        let format =
            DisplayFormat::from_str(format).map_err(|_| Error::UnknownFormat(format.to_string()))?;
        self.set_format(exec, name, format)
    }

    /// Assign `expression` to a handle, return the new display value.
    pub fn assign(
        &mut self,
        exec: &impl Executor,
        name: &str,
        expression: &str,
    ) -> Result<String, Error> {
        self.handle_mut(name)?;
        let record = exec.execute(&format!("-var-assign {name} {}", quote(expression)))?;
        self.apply_value(name, &record)
    }

    /// Re-read the value of a single handle.
    pub fn refresh(&mut self, exec: &impl Executor, name: &str) -> Result<String, Error> {
        self.handle_mut(name)?;
        let record = exec.execute(&format!("-var-evaluate-expression {name}"))?;
        self.apply_value(name, &record)
    }

    fn apply_value(&mut self, name: &str, record: &ResultRecord) -> Result<String, Error> {
        let raw = field(&record.results, "value")?;
        let handle = self.handle_mut(name)?;
        handle.value = normalize(raw, handle.format);
        Ok(handle.value.clone())
    }

    /// Ask the backend for all changed objects and apply the change list.
    /// Entries for unknown names are returned but not applied.
    pub fn bulk_update(&mut self, exec: &impl Executor) -> Result<Vec<VarChange>, Error> {
        let record = exec.execute("-var-update --all-values *")?;

        let Some(changelist) = record.results.get("changelist").and_then(Value::as_list) else {
            return Ok(vec![]);
        };

        let mut changes = vec![];
        for entry in changelist.values().filter_map(Value::as_tuple) {
            let Some(name) = entry.get_str("name") else {
                continue;
            };
            let type_changed = entry.get_str("type_changed") == Some("true");
            let in_scope = entry.get_str("in_scope").map_or(true, |s| s == "true");

            let value = match self.handles.get(name) {
                Some(_) => self.apply_change(name, entry, type_changed)?,
                None => {
                    crate::mib_debug!(target: "varobj", "change for unknown object {name}");
                    entry
                        .get_str("value")
                        .map(|raw| normalize(raw, DisplayFormat::Natural))
                }
            };

            changes.push(VarChange {
                name: name.to_string(),
                value,
                in_scope,
                type_changed,
            });
        }

        Ok(changes)
    }

    fn apply_change(
        &mut self,
        name: &str,
        entry: &Results,
        type_changed: bool,
    ) -> Result<Option<String>, Error> {
        let mut retired = None;
        let mut gained = false;

        let handle = self.handle_mut(name)?;
        if let Some(raw) = entry.get_str("value") {
            handle.value = normalize(raw, handle.format);
        }
        if type_changed {
            if let Some(new_type) = entry.get_str("new_type") {
                handle.type_name = new_type.to_string();
            }
            handle.child_count = count(entry, "new_num_children");
            match (handle.child_count, handle.reference) {
                (0, Some(reference)) => {
                    handle.reference = None;
                    retired = Some(reference);
                }
                (n, None) if n > 0 => gained = true,
                _ => {}
            }
        }
        let value = entry.get_str("value").map(|_| handle.value.clone());

        if let Some(reference) = retired {
            self.by_ref.remove(&reference);
        }
        if gained {
            let reference = self.allocate_ref(name)?;
            self.handle_mut(name)?.reference = Some(reference);
        }

        Ok(value)
    }

    /// Drop handles rejected by `policy` from both indices. Backend objects are
    /// not deleted.
    pub fn sweep(&mut self, policy: &impl RetentionPolicy) -> usize {
        let before = self.handles.len();
        let by_ref = &mut self.by_ref;
        self.handles.retain(|_, handle| {
            let keep = policy.retain(handle);
            if !keep {
                if let Some(reference) = handle.reference {
                    by_ref.remove(&reference);
                }
            }
            keep
        });
        before - self.handles.len()
    }
}
