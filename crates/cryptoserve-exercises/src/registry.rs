// ============================================
// File: crates/cryptoserve-exercises/src/registry.rs
// ============================================
//! # Exercise Registry
//!
//! ## Creation Reason
//! Exercises are registered statically through a [`Catalog`] of units and
//! collected once at startup into an immutable, ordinal-indexed registry
//! that every connection shares.
//!
//! ## Main Functionality
//! - `ExerciseUnit`: a named provider that loads zero or more exercises
//! - `Catalog`: an ordered tree of units and groups
//! - `ExerciseRegistry::discover`: depth-first collection with ordinals
//! - `ExerciseRegistry::resolve`: selection text to exercise
//!
//! ## Discovery Rules
//! 1. Units are visited depth-first in catalog order
//! 2. A unit that fails to load is logged and skipped
//! 3. Exercises whose name starts with `_` are private and skipped
//! 4. A repeated name keeps the first registration
//! 5. Ordinal = position in the resulting list, starting at 0
//!
//! ## Selection Rules
//! - Leading and trailing whitespace is ignored for ordinals and names
//! - A non-negative base-10 integer selects by ordinal
//! - Anything else must equal a name or title exactly (case-sensitive)
//!
//! ## ⚠️ Important Note for Next Developer
//! - Ordinals are shown in the greeting menu; keep catalog order stable
//! - Out-of-range ordinals are rejected, never clamped
//!
//! ## Last Modified
//! v0.1.0 - Initial static registry

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use cryptoserve_core::report::ExerciseError;

use crate::error::Result;
use crate::exercise::Exercise;
use crate::tables::Tables;

// ============================================
// ExerciseUnit
// ============================================

/// A statically registered provider of exercises.
pub trait ExerciseUnit: Send + Sync {
    /// Unit name, used in logs.
    fn name(&self) -> &str;

    /// Builds the unit's exercises.
    ///
    /// # Errors
    /// Returns a `RegistryError` if the unit cannot be loaded; discovery
    /// then skips it.
    fn load(&self, tables: &Arc<Tables>) -> Result<Vec<Arc<dyn Exercise>>>;
}

/// Loader function of a [`StaticUnit`].
pub type Loader = fn(&Arc<Tables>) -> Result<Vec<Arc<dyn Exercise>>>;

/// An [`ExerciseUnit`] backed by a plain function.
#[derive(Clone, Copy)]
pub struct StaticUnit {
    name: &'static str,
    loader: Loader,
}

impl StaticUnit {
    /// Creates a unit.
    #[must_use]
    pub const fn new(name: &'static str, loader: Loader) -> Self {
        Self { name, loader }
    }
}

impl ExerciseUnit for StaticUnit {
    fn name(&self) -> &str {
        self.name
    }

    fn load(&self, tables: &Arc<Tables>) -> Result<Vec<Arc<dyn Exercise>>> {
        (self.loader)(tables)
    }
}

impl fmt::Debug for StaticUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticUnit")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// ============================================
// Catalog
// ============================================

/// A node of the catalog tree.
pub enum CatalogNode {
    /// A single unit.
    Unit(Box<dyn ExerciseUnit>),
    /// A named group of nodes, visited in order.
    Group {
        /// Group name, used in logs.
        name: String,
        /// Nested nodes.
        children: Catalog,
    },
}

/// Ordered tree of exercise units.
#[derive(Default)]
pub struct Catalog {
    nodes: Vec<CatalogNode>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a unit.
    #[must_use]
    pub fn unit(mut self, unit: impl ExerciseUnit + 'static) -> Self {
        self.nodes.push(CatalogNode::Unit(Box::new(unit)));
        self
    }

    /// Appends a nested group.
    #[must_use]
    pub fn group(mut self, name: impl Into<String>, children: Self) -> Self {
        self.nodes.push(CatalogNode::Group {
            name: name.into(),
            children,
        });
        self
    }

    /// Top-level nodes, in order.
    #[must_use]
    pub fn nodes(&self) -> &[CatalogNode] {
        &self.nodes
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

// ============================================
// ExerciseDescriptor
// ============================================

/// A registered exercise and its menu identity.
#[derive(Clone)]
pub struct ExerciseDescriptor {
    name: String,
    title: String,
    ordinal: usize,
    exercise: Arc<dyn Exercise>,
}

impl ExerciseDescriptor {
    /// snake_case name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Title Case name.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Zero-based position in the menu.
    #[must_use]
    pub const fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// The exercise itself.
    #[must_use]
    pub fn exercise(&self) -> Arc<dyn Exercise> {
        Arc::clone(&self.exercise)
    }
}

impl fmt::Debug for ExerciseDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExerciseDescriptor")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("ordinal", &self.ordinal)
            .finish_non_exhaustive()
    }
}

// ============================================
// Selector
// ============================================

/// How a peer selected an exercise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Base-10 menu position.
    Ordinal(usize),
    /// Exact name or title.
    Name(String),
}

impl Selector {
    /// Parses selection text after trimming surrounding whitespace.
    /// Anything that is not a non-negative integer is treated as a name.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        text.parse::<usize>()
            .map_or_else(|_| Self::Name(text.to_owned()), Self::Ordinal)
    }
}

// ============================================
// ExerciseRegistry
// ============================================

/// Immutable, ordinal-indexed set of exercises.
#[derive(Debug, Default, Clone)]
pub struct ExerciseRegistry {
    exercises: Vec<ExerciseDescriptor>,
}

impl ExerciseRegistry {
    /// Collects every exercise reachable from `catalog`.
    #[must_use]
    pub fn discover(catalog: &Catalog, tables: &Arc<Tables>) -> Self {
        let mut registry = Self::default();
        registry.walk(catalog.nodes(), tables);
        debug!(count = registry.len(), "Exercise discovery complete");
        registry
    }

    /// Builds a registry from already constructed exercises, applying the
    /// same privacy and duplicate rules as discovery.
    #[must_use]
    pub fn from_exercises(exercises: impl IntoIterator<Item = Arc<dyn Exercise>>) -> Self {
        let mut registry = Self::default();
        for exercise in exercises {
            registry.register(exercise);
        }
        registry
    }

    fn walk(&mut self, nodes: &[CatalogNode], tables: &Arc<Tables>) {
        for node in nodes {
            match node {
                CatalogNode::Unit(unit) => match unit.load(tables) {
                    Ok(exercises) => {
                        for exercise in exercises {
                            self.register(exercise);
                        }
                    }
                    Err(e) => {
                        warn!(unit = unit.name(), error = %e, "Skipping exercise unit");
                    }
                },
                CatalogNode::Group { name, children } => {
                    debug!(group = %name, "Entering exercise group");
                    self.walk(children.nodes(), tables);
                }
            }
        }
    }

    fn register(&mut self, exercise: Arc<dyn Exercise>) {
        let name = exercise.name().to_owned();

        if name.starts_with('_') {
            debug!(exercise = %name, "Skipping private exercise");
            return;
        }

        if self.exercises.iter().any(|d| d.name == name) {
            warn!(exercise = %name, "Duplicate exercise name, keeping the first");
            return;
        }

        let descriptor = ExerciseDescriptor {
            title: exercise.title(),
            ordinal: self.exercises.len(),
            name,
            exercise,
        };

        debug!(
            exercise = %descriptor.name,
            ordinal = descriptor.ordinal,
            "Registered exercise"
        );
        self.exercises.push(descriptor);
    }

    // ========================================
    // Lookup
    // ========================================

    /// Resolves selection text sent by a peer.
    ///
    /// # Errors
    /// Returns an `InvalidSelection` error if nothing matches.
    pub fn resolve(&self, text: &str) -> std::result::Result<&ExerciseDescriptor, ExerciseError> {
        self.lookup(&Selector::parse(text))
    }

    /// Looks up an exercise by ordinal, name or title.
    ///
    /// # Errors
    /// Returns an `InvalidSelection` error if nothing matches.
    pub fn lookup(
        &self,
        selector: &Selector,
    ) -> std::result::Result<&ExerciseDescriptor, ExerciseError> {
        match selector {
            Selector::Ordinal(ordinal) => self.get(*ordinal).ok_or_else(|| {
                ExerciseError::invalid_selection(format!("no exercise with number {ordinal}"))
                    .with_explanation(format!(
                        "Exercise numbers range from 0 to {}.",
                        self.len().saturating_sub(1)
                    ))
                    .with_hint("Pick a number from the list in the greeting.")
            }),
            Selector::Name(name) => self
                .exercises
                .iter()
                .find(|d| d.name == *name || d.title == *name)
                .ok_or_else(|| {
                    ExerciseError::invalid_selection(format!("no exercise named '{name}'"))
                        .with_explanation(
                            "The selection must be an exercise number or an exact exercise name.",
                        )
                        .with_hints([
                            "Are you sending the number shown in the menu?",
                            "Names are case-sensitive, e.g. 'Simple Hash' or 'simple_hash'.",
                        ])
                }),
        }
    }

    /// Returns the exercise at `ordinal`.
    #[must_use]
    pub fn get(&self, ordinal: usize) -> Option<&ExerciseDescriptor> {
        self.exercises.get(ordinal)
    }

    /// Iterates in ordinal order.
    pub fn iter(&self) -> impl Iterator<Item = &ExerciseDescriptor> {
        self.exercises.iter()
    }

    /// Number of registered exercises.
    #[must_use]
    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cryptoserve_core::report::ErrorKind;
    use cryptoserve_transport::Channel;

    use crate::error::RegistryError;

    struct Named(&'static str);

    #[async_trait]
    impl Exercise for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn run(&self, _channel: &mut Channel) -> cryptoserve_transport::Result<()> {
            Ok(())
        }
    }

    fn load_pair(_: &Arc<Tables>) -> Result<Vec<Arc<dyn Exercise>>> {
        Ok(vec![Arc::new(Named("alpha_one")), Arc::new(Named("_hidden"))])
    }

    fn load_beta(_: &Arc<Tables>) -> Result<Vec<Arc<dyn Exercise>>> {
        Ok(vec![Arc::new(Named("beta"))])
    }

    fn load_broken(_: &Arc<Tables>) -> Result<Vec<Arc<dyn Exercise>>> {
        Err(RegistryError::load_failed("broken", "boom"))
    }

    fn registry() -> ExerciseRegistry {
        let catalog = Catalog::new()
            .unit(StaticUnit::new("pair", load_pair))
            .unit(StaticUnit::new("broken", load_broken))
            .group(
                "nested",
                Catalog::new()
                    .unit(StaticUnit::new("beta", load_beta))
                    .unit(StaticUnit::new("again", load_beta)),
            );
        ExerciseRegistry::discover(&catalog, &Arc::new(Tables::default()))
    }

    #[test]
    fn test_discovery_order_and_skips() {
        let registry = registry();
        let names: Vec<_> = registry.iter().map(ExerciseDescriptor::name).collect();
        assert_eq!(names, vec!["alpha_one", "beta"]);
        assert_eq!(registry.get(1).unwrap().ordinal(), 1);
        assert_eq!(registry.get(0).unwrap().title(), "Alpha One");
    }

    #[test]
    fn test_resolve_by_ordinal_name_and_title() {
        let registry = registry();
        assert_eq!(registry.resolve("1").unwrap().name(), "beta");
        assert_eq!(registry.resolve(" 0\n").unwrap().name(), "alpha_one");
        assert_eq!(registry.resolve("alpha_one").unwrap().ordinal(), 0);
        assert_eq!(registry.resolve("Alpha One").unwrap().ordinal(), 0);
    }

    #[test]
    fn test_whitespace_ignored_for_names_and_ordinals() {
        let registry = registry();
        assert_eq!(registry.resolve("beta\n").unwrap().ordinal(), 1);
        assert_eq!(registry.resolve("  Alpha One \r\n").unwrap().ordinal(), 0);
        assert_eq!(registry.resolve("\t1 ").unwrap().name(), "beta");
        assert_eq!(Selector::parse(" Red Dog\n"), Selector::Name("Red Dog".into()));
    }

    #[test]
    fn test_out_of_range_ordinal_rejected() {
        let registry = registry();
        let err = registry.resolve("2").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSelection);
        assert!(err.explanation().contains("0 to 1"));
    }

    #[test]
    fn test_unknown_and_private_names_rejected() {
        let registry = registry();
        for text in ["gamma", "_hidden", "-1", "alpha one", ""] {
            let err = registry.resolve(text).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidSelection, "{text:?}");
        }
    }

    #[test]
    fn test_selector_parse() {
        assert_eq!(Selector::parse("3"), Selector::Ordinal(3));
        assert_eq!(Selector::parse("Red Dog"), Selector::Name("Red Dog".into()));
        assert_eq!(
            Selector::parse("99999999999999999999999"),
            Selector::Name("99999999999999999999999".into())
        );
    }

    #[test]
    fn test_from_exercises() {
        let registry = ExerciseRegistry::from_exercises([
            Arc::new(Named("x")) as Arc<dyn Exercise>,
            Arc::new(Named("x")),
        ]);
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }
}
