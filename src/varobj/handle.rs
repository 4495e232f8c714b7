use std::fmt::{Display, Formatter};
use std::num::NonZeroU32;
use strum_macros::{Display as StrumDisplay, EnumString, IntoStaticStr};

/// Display format of a variable object, spelled the way the backend expects.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, StrumDisplay, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum DisplayFormat {
    #[default]
    Natural,
    Binary,
    Octal,
    Decimal,
    Hexadecimal,
}

/// Reference number of a variable object that has children.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarRef(NonZeroU32);

impl VarRef {
    pub fn new(number: u32) -> Option<Self> {
        NonZeroU32::new(number).map(VarRef)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl From<NonZeroU32> for VarRef {
    fn from(number: NonZeroU32) -> Self {
        VarRef(number)
    }
}

impl Display for VarRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Thread and frame a variable object is created in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct VarScope {
    pub thread: Option<u32>,
    pub frame: Option<u32>,
}

impl VarScope {
    pub fn new(thread: u32, frame: u32) -> Self {
        Self {
            thread: Some(thread),
            frame: Some(frame),
        }
    }

    /// Options for a `-var-create` command.
    pub(super) fn command_options(&self) -> String {
        let mut options = String::new();
        if let Some(thread) = self.thread {
            options.push_str(&format!("--thread {thread} "));
        }
        if let Some(frame) = self.frame {
            options.push_str(&format!("--frame {frame} "));
        }
        options
    }
}

/// Remote variable object known to the cache.
#[derive(Clone, Debug, PartialEq)]
pub struct VarHandle {
    /// Backend-assigned unique name, like `var1.field`.
    pub name: String,
    /// Expression or member name shown to a user.
    pub display_name: String,
    /// Value in display form.
    pub value: String,
    pub type_name: String,
    /// `None` for leaf objects.
    pub reference: Option<VarRef>,
    pub child_count: u32,
    pub format: DisplayFormat,
    pub thread_id: Option<u32>,
}

impl VarHandle {
    /// Reference number, 0 for leaf objects.
    pub fn reference_number(&self) -> u32 {
        self.reference.map(VarRef::get).unwrap_or(0)
    }

    pub fn has_children(&self) -> bool {
        self.reference.is_some()
    }
}
