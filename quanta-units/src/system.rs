//! Unit systems, dimension formats and the per-thread active-system stack
//!
//! The active system decides how unit symbols are resolved when no system
//! is given explicitly. It is kept on a thread-local stack; `UnitSystem`
//! is the scope guard that pushes a frame and pops it again on `close` or
//! drop.

use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::str::FromStr;
use tracing::debug;

use quanta_core::{Result, UnitError};

/// A named system of units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SystemType {
    SI,
    US,
    ESU,
    EMU,
}

impl SystemType {
    pub const ALL: [SystemType; 4] = [SystemType::SI, SystemType::US, SystemType::ESU, SystemType::EMU];

    /// Short name, also used as the `US_` style expression tag
    pub fn abbrev(&self) -> &'static str {
        match self {
            SystemType::SI => "SI",
            SystemType::US => "US",
            SystemType::ESU => "ESU",
            SystemType::EMU => "EMU",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SystemType::SI => "International System of Units",
            SystemType::US => "United States customary units",
            SystemType::ESU => "Gaussian electrostatic units",
            SystemType::EMU => "Gaussian electromagnetic units",
        }
    }

    /// Preferred unit for each base dimension, in L M T I Θ N J order
    pub fn preferred_units(&self) -> [&'static str; 7] {
        match self {
            SystemType::SI => ["m", "kg", "s", "A", "K", "mol", "cd"],
            SystemType::US => ["ft", "lb", "s", "A", "degR", "mol", "cd"],
            SystemType::ESU => ["cm", "g", "s", "statA", "K", "mol", "cd"],
            SystemType::EMU => ["cm", "g", "s", "abA", "K", "mol", "cd"],
        }
    }

    pub fn from_abbrev(s: &str) -> Option<SystemType> {
        SystemType::ALL.into_iter().find(|sys| sys.abbrev() == s)
    }
}

impl FromStr for SystemType {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self> {
        SystemType::from_abbrev(&s.to_ascii_uppercase())
            .ok_or_else(|| UnitError::unknown_unit(format!("unit system '{}'", s)))
    }
}

impl fmt::Display for SystemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbrev())
    }
}

impl Default for SystemType {
    fn default() -> Self {
        SystemType::SI
    }
}

/// Base-unit conventions for expressing a quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dformat {
    MKS,
    MGS,
    CGS,
    FPS,
}

impl Dformat {
    pub const ALL: [Dformat; 4] = [Dformat::MKS, Dformat::MGS, Dformat::CGS, Dformat::FPS];

    pub fn abbrev(&self) -> &'static str {
        match self {
            Dformat::MKS => "MKS",
            Dformat::MGS => "MGS",
            Dformat::CGS => "CGS",
            Dformat::FPS => "FPS",
        }
    }

    /// Base units in L M T I Θ N J order
    pub fn base_units(&self) -> [&'static str; 7] {
        match self {
            Dformat::MKS => ["m", "kg", "s", "A", "K", "mol", "cd"],
            Dformat::MGS => ["m", "g", "s", "A", "K", "mol", "cd"],
            Dformat::CGS => ["cm", "g", "s", "A", "K", "mol", "cd"],
            Dformat::FPS => ["ft", "lb", "s", "A", "K", "mol", "cd"],
        }
    }

    /// System in which every base unit of the format is defined
    pub fn native_system(&self) -> SystemType {
        match self {
            Dformat::FPS => SystemType::US,
            _ => SystemType::SI,
        }
    }
}

impl FromStr for Dformat {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.to_ascii_uppercase();
        Dformat::ALL
            .into_iter()
            .find(|f| f.abbrev() == upper)
            .ok_or_else(|| UnitError::unknown_unit(format!("dimension format '{}'", s)))
    }
}

impl fmt::Display for Dformat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbrev())
    }
}

/// Stack of active unit systems for one thread
#[derive(Debug, Default)]
pub struct SystemStack {
    frames: Vec<(u64, SystemType)>,
}

impl SystemStack {
    /// System on top of the stack, `SI` when empty
    pub fn active(&self) -> SystemType {
        self.frames.last().map(|(_, sys)| *sys).unwrap_or_default()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    fn push(&mut self, id: u64, system: SystemType) {
        self.frames.push((id, system));
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.frames.iter().position(|(frame, _)| *frame == id)
    }

    fn replace(&mut self, id: u64, system: SystemType) -> bool {
        match self.position(id) {
            Some(pos) => {
                self.frames[pos].1 = system;
                true
            }
            None => false,
        }
    }

    /// Drop the frame `id` together with every frame pushed after it
    fn pop_through(&mut self, id: u64) -> bool {
        match self.position(id) {
            Some(pos) => {
                self.frames.truncate(pos);
                true
            }
            None => false,
        }
    }
}

thread_local! {
    static STACK: RefCell<SystemStack> = RefCell::new(SystemStack::default());
    static NEXT_FRAME: Cell<u64> = const { Cell::new(0) };
}

/// The unit system currently active on this thread
pub fn active_system() -> SystemType {
    STACK.with(|stack| stack.borrow().active())
}

/// Number of open `UnitSystem` scopes on this thread
pub fn scope_depth() -> usize {
    STACK.with(|stack| stack.borrow().depth())
}

/// Scope guard selecting the active unit system
///
/// Scopes nest LIFO. Closing a scope also closes every scope opened inside
/// it. The guard is bound to the thread that created it.
#[derive(Debug)]
pub struct UnitSystem {
    id: u64,
    system: SystemType,
    open: bool,
    _not_send: PhantomData<Rc<()>>,
}

impl UnitSystem {
    /// Open a scope and make `system` active
    pub fn new(system: SystemType) -> Self {
        let id = NEXT_FRAME.with(|next| {
            let id = next.get();
            next.set(id + 1);
            id
        });
        STACK.with(|stack| stack.borrow_mut().push(id, system));
        debug!(system = %system, "entered unit system");
        UnitSystem {
            id,
            system,
            open: true,
            _not_send: PhantomData,
        }
    }

    pub fn enter(system: SystemType) -> Self {
        Self::new(system)
    }

    /// Switch the system of this scope while it stays open
    pub fn change(&mut self, system: SystemType) {
        if !self.open {
            return;
        }
        let replaced = STACK.with(|stack| stack.borrow_mut().replace(self.id, system));
        if replaced {
            debug!(from = %self.system, to = %system, "changed unit system");
            self.system = system;
        } else {
            self.open = false;
        }
    }

    /// Restore the system that was active before this scope; idempotent
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        let popped = STACK.with(|stack| stack.borrow_mut().pop_through(self.id));
        if popped {
            debug!(system = %self.system, restored = %active_system(), "closed unit system");
        }
    }

    pub fn system(&self) -> SystemType {
        self.system
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl Drop for UnitSystem {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_si() {
        assert_eq!(active_system(), SystemType::SI);
    }

    #[test]
    fn test_scope_restores_on_drop() {
        {
            let _us = UnitSystem::new(SystemType::EMU);
            assert_eq!(active_system(), SystemType::EMU);
        }
        assert_eq!(active_system(), SystemType::SI);
    }

    #[test]
    fn test_change_and_close() {
        let mut us = UnitSystem::new(SystemType::ESU);
        assert_eq!(active_system(), SystemType::ESU);
        us.change(SystemType::US);
        assert_eq!(active_system(), SystemType::US);
        assert_eq!(us.system(), SystemType::US);
        us.close();
        assert_eq!(active_system(), SystemType::SI);
        us.close();
        assert_eq!(active_system(), SystemType::SI);
        assert!(!us.is_open());
    }

    #[test]
    fn test_nesting() {
        let mut outer = UnitSystem::new(SystemType::US);
        {
            let _inner = UnitSystem::new(SystemType::ESU);
            assert_eq!(active_system(), SystemType::ESU);
        }
        assert_eq!(active_system(), SystemType::US);

        let inner = UnitSystem::new(SystemType::EMU);
        outer.close();
        assert_eq!(active_system(), SystemType::SI);
        assert_eq!(scope_depth(), 0);
        drop(inner);
        assert_eq!(active_system(), SystemType::SI);
    }

    #[test]
    fn test_stale_guard_does_not_close_newer_scope() {
        let mut outer = UnitSystem::new(SystemType::US);
        let mut inner = UnitSystem::new(SystemType::ESU);
        outer.close();
        let _fresh = UnitSystem::new(SystemType::EMU);
        inner.close();
        assert_eq!(active_system(), SystemType::EMU);
    }

    #[test]
    fn test_restored_after_panic() {
        let result = std::panic::catch_unwind(|| {
            let _us = UnitSystem::new(SystemType::ESU);
            panic!("boom");
        });
        assert!(result.is_err());
        assert_eq!(active_system(), SystemType::SI);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("us".parse::<SystemType>().unwrap(), SystemType::US);
        assert!("XYZ".parse::<SystemType>().is_err());
        assert_eq!("cgs".parse::<Dformat>().unwrap(), Dformat::CGS);
    }
}
