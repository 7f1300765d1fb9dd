//! Name based entity search
//!
//! The pool holds entity definitions gathered from class declarations.
//! String queries are matched word by word against camel-case names:
//! `"red speck"` finds `redSpeck`, and `"speck"` prefers `speck` over
//! `redSpeck` because fewer name words make the more specific hit. When a
//! query matches nothing by entity name alone, words of the owning class
//! may qualify it, so `"marble speck"` picks the speck declared on
//! `Marble`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::collections::HashSet;
use std::fmt;
use tracing::trace;

use crate::entity::{ClassRef, Entity, EntityDef, Resolvable};
use crate::error::{Error, Result};

static NAME_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"((?:[A-Z0-9]|^[a-z])[a-z]*)").expect("name word pattern is valid"));

/// Lower-cased words of a camel-case name
pub fn name_words(name: &str) -> Vec<String> {
    NAME_WORD
        .find_iter(name)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Something to search for
#[derive(Debug, Clone, Copy)]
pub enum Query<'a> {
    /// Space separated words
    Name(&'a str),
    /// A declared definition, matched by equality
    Def(&'a EntityDef),
    /// A class, matched against the class entries of the pool
    Class(&'a ClassRef),
}

impl<'a> From<&'a str> for Query<'a> {
    fn from(query: &'a str) -> Self {
        Query::Name(query)
    }
}

impl<'a> From<&'a String> for Query<'a> {
    fn from(query: &'a String) -> Self {
        Query::Name(query)
    }
}

impl<'a> From<&'a EntityDef> for Query<'a> {
    fn from(def: &'a EntityDef) -> Self {
        Query::Def(def)
    }
}

impl<'a> From<&'a ClassRef> for Query<'a> {
    fn from(class: &'a ClassRef) -> Self {
        Query::Class(class)
    }
}

impl fmt::Display for Query<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Name(name) => f.write_str(name),
            Query::Def(def) => write!(f, "{def}"),
            Query::Class(class) => write!(f, "[{}]", class.name()),
        }
    }
}

/// A pool entry: a definition, where its entity should live and who declares it
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub entity: EntityDef,
    /// Parent for the created entity; the caller's choice when `None`
    pub parent: Option<Resolvable<Entity>>,
    /// Declaring class; `None` for the entry standing for a class itself
    pub owner: Option<ClassRef>,
}

impl SearchResult {
    fn words(&self) -> Vec<String> {
        name_words(self.entity.key())
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.owner {
            Some(owner) => write!(f, "{}.{}", owner.name(), self.entity),
            None => write!(f, "{}", self.entity),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Searcher {
    pool: Vec<SearchResult>,
}

impl Searcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Searcher seeded with one class and its members
    pub fn for_class(class: &ClassRef) -> Self {
        let mut searcher = Self::new();
        searcher.add_class(class, None);
        searcher
    }

    /// Add the class itself and every declared member
    pub fn add_class(&mut self, class: &ClassRef, parent: Option<Resolvable<Entity>>) {
        self.pool.push(SearchResult {
            entity: EntityDef::class(class),
            parent: parent.clone(),
            owner: None,
        });
        for (_, def) in class.members() {
            self.pool.push(SearchResult {
                entity: def.clone(),
                parent: parent.clone(),
                owner: Some(class.clone()),
            });
        }
    }

    pub fn add(&mut self, result: SearchResult) {
        self.pool.push(result);
    }

    pub fn pool(&self) -> &[SearchResult] {
        &self.pool
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn search<'q>(&self, query: impl Into<Query<'q>>) -> Result<SearchResult> {
        let query = query.into();
        let found = match query {
            Query::Name(name) => self.search_words(name),
            Query::Def(def) => self.search_equal(query, |r| &r.entity == def),
            Query::Class(class) => {
                let def = EntityDef::class(class);
                self.search_equal(query, |r| r.entity == def)
            }
        }?;
        trace!("Search [{}] resolved to {}", query, found);
        Ok(found)
    }

    fn search_equal(&self, query: Query<'_>, matches: impl Fn(&SearchResult) -> bool) -> Result<SearchResult> {
        let hits: Vec<&SearchResult> = self.pool.iter().filter(|r| matches(r)).collect();
        match hits.as_slice() {
            [] => Err(self.not_found(query)),
            [only] => Ok((*only).clone()),
            many => Err(Error::AmbiguousKey {
                query: query.to_string(),
                matches: many.iter().map(|r| r.to_string()).collect(),
            }),
        }
    }

    fn search_words(&self, query: &str) -> Result<SearchResult> {
        let wanted: HashSet<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if wanted.is_empty() {
            return Err(self.not_found(Query::Name(query)));
        }

        // entity word count -> hits
        let mut direct: BTreeMap<usize, Vec<&SearchResult>> = BTreeMap::new();
        let mut qualified: BTreeMap<usize, Vec<&SearchResult>> = BTreeMap::new();

        for result in &self.pool {
            let words = result.words();
            let own: HashSet<&str> = words.iter().map(String::as_str).collect();
            if wanted.iter().all(|w| own.contains(w.as_str())) {
                direct.entry(words.len()).or_default().push(result);
                continue;
            }

            let Some(owner) = &result.owner else {
                continue;
            };
            let owner_words = name_words(owner.name());
            let touches_entity = wanted.iter().any(|w| own.contains(w.as_str()));
            let covered = wanted
                .iter()
                .all(|w| own.contains(w.as_str()) || owner_words.iter().any(|o| o == w));
            if touches_entity && covered {
                qualified.entry(words.len()).or_default().push(result);
            }
        }

        let tiers = if direct.is_empty() { qualified } else { direct };
        match tiers.into_iter().next() {
            None => Err(self.not_found(Query::Name(query))),
            Some((_, hits)) if hits.len() == 1 => Ok(hits[0].clone()),
            Some((_, hits)) => Err(Error::AmbiguousKey {
                query: query.to_string(),
                matches: hits.iter().map(|r| r.to_string()).collect(),
            }),
        }
    }

    fn not_found(&self, query: Query<'_>) -> Error {
        Error::KeyNotFound {
            query: query.to_string(),
            candidates: self.pool.iter().map(|r| r.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Capability, EntityClass};
    use test_case::test_case;

    #[test_case("speck", &["speck"])]
    #[test_case("redSpeck", &["red", "speck"])]
    #[test_case("SaveDialog", &["save", "dialog"])]
    #[test_case("button2Label", &["button", "2", "label"])]
    #[test_case("OK", &["o", "k"])]
    fn test_name_words(name: &str, words: &[&str]) {
        assert_eq!(name_words(name), words);
    }

    fn marble() -> ClassRef {
        let button = EntityClass::builder("Button").capability(Capability::Clickable).build();
        EntityClass::builder("Marble")
            .member("SPECK", EntityDef::sub("speck", &button))
            .member("RED_SPECK", EntityDef::sub("redSpeck", &button))
            .member("SPECKLE", EntityDef::sub("speckle", &button))
            .build()
    }

    #[test]
    fn test_fewest_words_wins() {
        let searcher = Searcher::for_class(&marble());
        assert_eq!(searcher.search("speck").unwrap().entity.key(), "speck");
        assert_eq!(searcher.search("red speck").unwrap().entity.key(), "redSpeck");
        assert_eq!(searcher.search("SPECKLE").unwrap().entity.key(), "speckle");
    }

    #[test]
    fn test_class_entry_is_searchable() {
        let class = marble();
        let searcher = Searcher::for_class(&class);
        let found = searcher.search("marble").unwrap();
        assert!(found.owner.is_none());
        assert_eq!(searcher.search(&class).unwrap().entity, EntityDef::class(&class));
    }

    #[test]
    fn test_unknown_words_report_pool() {
        let searcher = Searcher::for_class(&marble());
        match searcher.search("blue speck").unwrap_err() {
            Error::KeyNotFound { candidates, .. } => assert_eq!(candidates.len(), 4),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(searcher.search("   "), Err(Error::KeyNotFound { .. })));
    }

    #[test]
    fn test_definition_query_uses_equality() {
        let class = marble();
        let searcher = Searcher::for_class(&class);
        let def = class.def("RED_SPECK").unwrap();
        let found = searcher.search(def).unwrap();
        assert_eq!(found.owner.as_ref().map(|o| o.name()), Some("Marble"));

        let button = EntityClass::builder("Button").build();
        let stranger = EntityDef::sub("speck", &EntityClass::builder("Label").build());
        assert!(matches!(searcher.search(&stranger), Err(Error::KeyNotFound { .. })));
        assert!(matches!(searcher.search(&button), Err(Error::KeyNotFound { .. })));
    }
}
