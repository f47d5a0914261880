//! # Namespace Mutator
//!
//! Regenerates the externally visible endpoint namespace for one
//! mutation cycle. Every canonical route except the reserved root gets
//! a fresh random suffix, and the matching artifact entry rebinds the
//! route's handler to the new public path under a per-cycle alias.
//!
//! ## Design
//!
//! `mutate` is a pure function of `(templates, cycle_id, entropy)`.
//! It builds the whole mapping and artifact in memory and returns them
//! together; nothing is observable by other components until the
//! publisher makes the pair durable. A failed mutation therefore leaves
//! no trace: the previous cycle's state stays in force.
//!
//! ## Security Notes
//!
//! - Suffixes come from OS entropy; a cycle never reuses a draw.
//! - A drawn public path that collides with an already-assigned public
//!   path or with any canonical path is re-drawn, never accepted.
//! - The root route passes through unchanged so liveness probes keep
//!   working across cycles.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::error::{MutatorError, Result};
use crate::models::{Artifact, MutatedRoute, NamespaceMapping, RouteTemplate, SUFFIX_LEN};
use crate::suffix::{EntropySuffixSource, SuffixSource};

/// Maximum suffix draws per route before the cycle is aborted.
const MAX_SUFFIX_ATTEMPTS: u32 = 16;

/// The namespace mutation engine.
///
/// # Example
///
/// ```rust
/// use chameleon_mutator::{Method, NamespaceMutator, RouteTemplate};
///
/// let templates = vec![
///     RouteTemplate::new(Method::Get, "/", "root"),
///     RouteTemplate::new(Method::Get, "/admin/login", "admin_login"),
/// ];
///
/// let mutator = NamespaceMutator::new();
/// let (mapping, artifact) = mutator.mutate(&templates, 1).unwrap();
///
/// assert_eq!(mapping.public_path_of("/"), Some("/"));
/// assert!(mapping.public_path_of("/admin/login").unwrap().starts_with("/admin/login_"));
/// assert_eq!(artifact.cycle_id, 1);
/// ```
#[derive(Debug, Clone)]
pub struct NamespaceMutator {
    /// Suffix length in characters.
    suffix_len: usize,
}

impl NamespaceMutator {
    /// Creates a mutator with the default suffix length.
    #[must_use]
    pub fn new() -> Self {
        Self {
            suffix_len: SUFFIX_LEN,
        }
    }

    /// Sets the suffix length.
    #[must_use]
    pub const fn with_suffix_len(mut self, len: usize) -> Self {
        self.suffix_len = len;
        self
    }

    /// Builds the mutated namespace for one cycle using OS entropy.
    ///
    /// # Arguments
    ///
    /// * `templates` - The canonical route set, loaded once and treated
    ///   as read-only.
    /// * `cycle_id` - Identifier of the cycle being generated.
    ///
    /// # Errors
    ///
    /// Returns [`MutatorError::Config`] if the template set is empty,
    /// lacks the reserved root route, or contains duplicate canonical
    /// paths, and [`MutatorError::SuffixExhausted`] if a unique public
    /// path could not be drawn. In both cases the cycle is aborted and
    /// the caller keeps serving the previous state.
    pub fn mutate(
        &self,
        templates: &[RouteTemplate],
        cycle_id: u64,
    ) -> Result<(NamespaceMapping, Artifact)> {
        self.mutate_with(templates, cycle_id, &mut EntropySuffixSource)
    }

    /// Builds the mutated namespace drawing suffixes from `source`.
    ///
    /// Behaves exactly like [`mutate`](Self::mutate); the explicit
    /// source exists so collision handling can be exercised with a
    /// scripted draw sequence.
    pub fn mutate_with(
        &self,
        templates: &[RouteTemplate],
        cycle_id: u64,
        source: &mut dyn SuffixSource,
    ) -> Result<(NamespaceMapping, Artifact)> {
        Self::validate_templates(templates)?;

        let mut mapping = NamespaceMapping::new(cycle_id);
        let mut routes = Vec::with_capacity(templates.len());

        // Public paths must not land on each other or on any canonical
        // path, otherwise a mutated address would shadow a live route.
        let mut taken: BTreeSet<String> = templates
            .iter()
            .map(|t| t.canonical_path.clone())
            .collect();

        for template in templates {
            let route = if template.is_root() {
                MutatedRoute {
                    method: template.method,
                    canonical_path: template.canonical_path.clone(),
                    public_path: template.canonical_path.clone(),
                    handler_id: template.handler_id.clone(),
                    handler_alias: template.handler_id.clone(),
                    cycle_id,
                }
            } else {
                let suffix = self.draw_unique_suffix(template, &taken, source)?;
                MutatedRoute {
                    method: template.method,
                    canonical_path: template.canonical_path.clone(),
                    public_path: format!("{}_{}", template.canonical_path, suffix),
                    handler_id: template.handler_id.clone(),
                    handler_alias: format!("{}_{}", template.handler_id, suffix),
                    cycle_id,
                }
            };

            debug!(
                canonical = %route.canonical_path,
                public = %route.public_path,
                cycle = cycle_id,
                "route mutated"
            );

            taken.insert(route.public_path.clone());
            mapping
                .routes
                .insert(route.canonical_path.clone(), route.clone());
            routes.push(route);
        }

        info!(
            cycle = cycle_id,
            routes = routes.len(),
            "namespace regenerated"
        );

        Ok((mapping, Artifact { cycle_id, routes }))
    }

    /// Draws a suffix whose resulting public path is not yet taken.
    fn draw_unique_suffix(
        &self,
        template: &RouteTemplate,
        taken: &BTreeSet<String>,
        source: &mut dyn SuffixSource,
    ) -> Result<String> {
        for attempt in 1..=MAX_SUFFIX_ATTEMPTS {
            let suffix = source.draw(self.suffix_len);
            let candidate = format!("{}_{}", template.canonical_path, suffix);
            if !taken.contains(&candidate) {
                return Ok(suffix);
            }
            debug!(
                canonical = %template.canonical_path,
                attempt,
                "suffix collision, re-drawing"
            );
        }
        Err(MutatorError::SuffixExhausted {
            canonical_path: template.canonical_path.clone(),
            attempts: MAX_SUFFIX_ATTEMPTS,
        })
    }

    /// Rejects template sets the mutator cannot safely operate on.
    fn validate_templates(templates: &[RouteTemplate]) -> Result<()> {
        if templates.is_empty() {
            return Err(MutatorError::Config(
                "canonical route set is empty".to_string(),
            ));
        }

        if !templates.iter().any(RouteTemplate::is_root) {
            return Err(MutatorError::Config(
                "canonical route set is missing the reserved root route".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        for template in templates {
            if !seen.insert(template.canonical_path.as_str()) {
                return Err(MutatorError::Config(format!(
                    "duplicate canonical path '{}'",
                    template.canonical_path
                )));
            }
        }

        Ok(())
    }
}

impl Default for NamespaceMutator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Method;

    /// Replays a fixed list of suffixes, then repeats the last one.
    struct ScriptedSource {
        draws: Vec<String>,
        next: usize,
    }

    impl ScriptedSource {
        fn new(draws: &[&str]) -> Self {
            Self {
                draws: draws.iter().map(|s| s.to_string()).collect(),
                next: 0,
            }
        }
    }

    impl SuffixSource for ScriptedSource {
        fn draw(&mut self, _len: usize) -> String {
            let idx = self.next.min(self.draws.len() - 1);
            self.next += 1;
            self.draws[idx].clone()
        }
    }

    fn templates() -> Vec<RouteTemplate> {
        vec![
            RouteTemplate::new(Method::Get, "/", "root"),
            RouteTemplate::new(Method::Get, "/admin/login", "admin_login"),
            RouteTemplate::new(Method::Get, "/api/balance", "api_balance"),
        ]
    }

    #[test]
    fn test_root_is_never_mutated() {
        let mutator = NamespaceMutator::new();
        let (mapping, _) = mutator.mutate(&templates(), 1).unwrap();
        assert_eq!(mapping.public_path_of("/"), Some("/"));
    }

    #[test]
    fn test_non_root_paths_get_suffixed() {
        let mutator = NamespaceMutator::new();
        let (mapping, _) = mutator.mutate(&templates(), 1).unwrap();

        let public = mapping.public_path_of("/admin/login").unwrap();
        assert!(public.starts_with("/admin/login_"));
        let suffix = public.strip_prefix("/admin/login_").unwrap();
        assert_eq!(suffix.len(), SUFFIX_LEN);
    }

    #[test]
    fn test_public_paths_unique_within_cycle() {
        let mutator = NamespaceMutator::new();
        let (mapping, artifact) = mutator.mutate(&templates(), 1).unwrap();

        let mut seen = BTreeSet::new();
        for route in &artifact.routes {
            assert!(seen.insert(route.public_path.clone()));
        }
        assert_eq!(mapping.len(), artifact.len());
    }

    #[test]
    fn test_forced_collision_triggers_redraw() {
        // "/login" + "_aaaaaa" lands exactly on the canonical path
        // "/login_aaaaaa"; the mutator must reject the draw and take
        // the next one instead of shadowing a live route.
        let set = vec![
            RouteTemplate::new(Method::Get, "/", "root"),
            RouteTemplate::new(Method::Get, "/login_aaaaaa", "admin_login"),
            RouteTemplate::new(Method::Get, "/login", "admin_login"),
        ];
        let mut source = ScriptedSource::new(&["bbbbbb", "aaaaaa", "cccccc"]);

        let mutator = NamespaceMutator::new();
        let (mapping, _) = mutator.mutate_with(&set, 1, &mut source).unwrap();

        // First draw goes to "/login_aaaaaa"; the second draw for
        // "/login" collides and is re-drawn to "cccccc".
        assert_eq!(
            mapping.public_path_of("/login_aaaaaa"),
            Some("/login_aaaaaa_bbbbbb")
        );
        assert_eq!(mapping.public_path_of("/login"), Some("/login_cccccc"));
    }

    #[test]
    fn test_collision_exhaustion_is_an_error() {
        // A source that only ever produces the colliding draw must
        // abort the cycle rather than silently overwrite.
        let set = vec![
            RouteTemplate::new(Method::Get, "/", "root"),
            RouteTemplate::new(Method::Get, "/login_aaaaaa", "admin_login"),
            RouteTemplate::new(Method::Get, "/login", "admin_login"),
        ];
        let mut source = ScriptedSource::new(&["bbbbbb", "aaaaaa"]);

        let mutator = NamespaceMutator::new();
        let result = mutator.mutate_with(&set, 1, &mut source);
        assert!(matches!(
            result,
            Err(MutatorError::SuffixExhausted { canonical_path, .. }) if canonical_path == "/login"
        ));
    }

    #[test]
    fn test_empty_template_set_rejected() {
        let mutator = NamespaceMutator::new();
        assert!(matches!(
            mutator.mutate(&[], 1),
            Err(MutatorError::Config(_))
        ));
    }

    #[test]
    fn test_missing_root_rejected() {
        let mutator = NamespaceMutator::new();
        let set = vec![RouteTemplate::new(Method::Get, "/admin/login", "admin_login")];
        assert!(matches!(
            mutator.mutate(&set, 1),
            Err(MutatorError::Config(_))
        ));
    }

    #[test]
    fn test_duplicate_canonical_path_rejected() {
        let mutator = NamespaceMutator::new();
        let set = vec![
            RouteTemplate::new(Method::Get, "/", "root"),
            RouteTemplate::new(Method::Get, "/x", "root"),
            RouteTemplate::new(Method::Post, "/x", "root"),
        ];
        assert!(matches!(
            mutator.mutate(&set, 1),
            Err(MutatorError::Config(_))
        ));
    }

    #[test]
    fn test_handler_alias_tracks_suffix() {
        let mutator = NamespaceMutator::new();
        let (mapping, _) = mutator.mutate(&templates(), 4).unwrap();

        let route = mapping.route_for("/api/balance").unwrap();
        let suffix = route.public_path.strip_prefix("/api/balance_").unwrap();
        assert_eq!(route.handler_alias, format!("api_balance_{suffix}"));
        assert_eq!(route.handler_id, "api_balance");
        assert_eq!(route.cycle_id, 4);
    }

    #[test]
    fn test_cycles_produce_fresh_namespaces() {
        let mutator = NamespaceMutator::new();
        let (first, _) = mutator.mutate(&templates(), 1).unwrap();
        let (second, _) = mutator.mutate(&templates(), 2).unwrap();

        assert_eq!(first.public_path_of("/"), second.public_path_of("/"));
        // A 6-character suffix repeating across two consecutive draws
        // would be a one-in-two-billion event.
        assert_ne!(
            first.public_path_of("/admin/login"),
            second.public_path_of("/admin/login")
        );
    }
}
