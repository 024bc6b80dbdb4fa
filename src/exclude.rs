use core::ops::Bound;

use crate::{
    bloom::BloomFilter,
    error::{Error, Result},
    name::Component,
};

// Exclusion of sibling values at one depth of the trie.
//
// The fillers form an ordered sequence with strictly increasing literals.
//  A literal rejects exactly its own value. Any and Bloom are ranges: they cover the
//  open interval between the literal before them (or the smallest value) and the
//  literal after them (or past the largest value). Two ranges are never adjacent.
//
// [Any, "c"] excludes everything up to and including "c"
// ["b", Any] excludes everything from "b" onward
// ["a", Bloom, "m"] excludes "a", "m" and what the filter matches in between

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Filler {
    Any,
    Bloom(BloomFilter),
    Literal(Component),
}

impl Filler {
    fn is_range(&self) -> bool {
        !matches!(self, Filler::Literal(_))
    }

    fn range_matches(&self, component: &Component) -> bool {
        match self {
            Filler::Any => true,
            Filler::Bloom(bloom) => bloom.matches(component.bytes()),
            Filler::Literal(_) => false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExcludeSpec {
    fillers: Vec<Filler>,
}

impl ExcludeSpec {
    pub fn new(fillers: Vec<Filler>) -> Result<Self> {
        let mut last_literal: Option<&Component> = None;
        let mut previous_was_range = false;
        for filler in fillers.iter() {
            match filler {
                Filler::Literal(c) => {
                    if last_literal.is_some_and(|l| l >= c) {
                        return Err(Error::UnorderedExclude);
                    }
                    last_literal = Some(c);
                    previous_was_range = false;
                }
                _ => {
                    if previous_was_range {
                        return Err(Error::UnorderedExclude);
                    }
                    previous_was_range = true;
                }
            }
        }
        Ok(Self { fillers })
    }

    pub fn from_components<I>(components: I) -> Self
    where
        I: IntoIterator<Item = Component>,
    {
        let mut components: Vec<_> = components.into_iter().collect();
        components.sort();
        components.dedup();
        Self {
            fillers: components.into_iter().map(Filler::Literal).collect(),
        }
    }

    pub fn up_to(component: Component) -> Self {
        Self {
            fillers: vec![Filler::Any, Filler::Literal(component)],
        }
    }

    pub fn fillers(&self) -> &[Filler] {
        &self.fillers
    }

    pub fn is_empty(&self) -> bool {
        self.fillers.is_empty()
    }

    pub fn matches(&self, component: &Component) -> bool {
        let mut pending_range: Option<&Filler> = None;
        for filler in self.fillers.iter() {
            match filler {
                Filler::Literal(literal) => {
                    if component == literal {
                        return true;
                    }
                    if component < literal {
                        // Falls between the previous literal and this one
                        return pending_range.is_some_and(|r| r.range_matches(component));
                    }
                    pending_range = None;
                }
                range => pending_range = Some(range),
            }
        }
        pending_range.is_some_and(|r| r.range_matches(component))
    }

    // Also excludes everything up to and including `component`,
    //  which turns "the sibling after this one" into a plain leftmost search.
    pub fn exclude_up_to(&mut self, component: Component) {
        let cut = self
            .fillers
            .iter()
            .position(|f| matches!(f, Filler::Literal(l) if *l > component))
            .unwrap_or(self.fillers.len());

        // The range right before the cut still applies above `component`
        let keep_from = if cut > 0 && self.fillers[cut - 1].is_range() {
            cut - 1
        } else {
            cut
        };

        let mut fillers = Vec::with_capacity(self.fillers.len() - keep_from + 2);
        fillers.push(Filler::Any);
        fillers.push(Filler::Literal(component));
        fillers.extend(self.fillers.drain(keep_from..));
        self.fillers = fillers;
    }

    // Mirror of `exclude_up_to`: also excludes everything from `component` onward
    pub fn exclude_from(&mut self, component: Component) {
        let cut = self
            .fillers
            .iter()
            .rposition(|f| matches!(f, Filler::Literal(l) if *l < component))
            .map(|i| i + 1)
            .unwrap_or(0);

        let keep_to = if cut < self.fillers.len() && self.fillers[cut].is_range() {
            cut + 1
        } else {
            cut
        };

        self.fillers.truncate(keep_to);
        self.fillers.push(Filler::Literal(component));
        self.fillers.push(Filler::Any);
    }

    // Siblings at or below this bound can be skipped by a left-to-right search
    pub fn lower_bound(&self) -> Bound<&Component> {
        match self.fillers.as_slice() {
            [Filler::Any, Filler::Literal(l), ..] => Bound::Excluded(l),
            _ => Bound::Unbounded,
        }
    }

    // Siblings at or above this bound can be skipped by a right-to-left search
    pub fn upper_bound(&self) -> Bound<&Component> {
        match self.fillers.as_slice() {
            [.., Filler::Literal(l), Filler::Any] => Bound::Excluded(l),
            _ => Bound::Unbounded,
        }
    }
}
