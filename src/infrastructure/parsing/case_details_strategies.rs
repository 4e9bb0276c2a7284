//! Strategies for the labeled "case details" fields of a detail page
//!
//! Two layouts are known: a definition list (`dt` labels followed by one or
//! more `dd` values) and flat records (a record node with one title child and
//! one value child).

use scraper::{ElementRef, Selector};
use std::collections::BTreeMap;
use tracing::debug;

use super::config::CaseDetailSelectors;
use super::text::{compile_selectors, element_text, normalize_key, select_first_matching};
use super::{CaseDetailsStrategy, DetailSource, ParsingResult};

/// Separator for several values under one label
const VALUE_SEPARATOR: &str = "\n";

/// `<dl><dt>Label</dt><dd>Value</dd><dd>Value</dd>...</dl>`
pub struct DefinitionListStrategy {
    list_selectors: Vec<Selector>,
}

/// `dt`/`dd` entries belonging to `list` itself: direct children, or children
/// of a `div` grouping wrapper. Entries of nested lists stay inside their `dd`.
fn list_entries<'a>(list: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    list.children()
        .filter_map(ElementRef::wrap)
        .flat_map(|child| {
            let grouped: Vec<ElementRef<'a>> = if child.value().name() == "div" {
                child.children().filter_map(ElementRef::wrap).collect()
            } else {
                vec![child]
            };
            grouped
        })
        .filter(|entry| matches!(entry.value().name(), "dt" | "dd"))
}

impl DefinitionListStrategy {
    pub fn new(selectors: &CaseDetailSelectors) -> ParsingResult<Self> {
        Ok(Self {
            list_selectors: compile_selectors(&selectors.definition_list)?,
        })
    }

    fn collect_list(&self, list: ElementRef<'_>, fields: &mut BTreeMap<String, Vec<String>>) {
        let mut current: Option<String> = None;

        for entry in list_entries(list) {
            let text = element_text(&entry);
            match entry.value().name() {
                "dt" => {
                    let key = normalize_key(&text);
                    if key.is_empty() {
                        current = None;
                    } else {
                        fields.entry(key.clone()).or_default();
                        current = Some(key);
                    }
                }
                _ => {
                    if let Some(key) = &current {
                        if !text.is_empty() {
                            fields.entry(key.clone()).or_default().push(text);
                        }
                    }
                }
            }
        }
    }
}

impl CaseDetailsStrategy for DefinitionListStrategy {
    fn name(&self) -> &'static str {
        "definition-list"
    }

    fn extract(&self, source: &DetailSource<'_>) -> Option<BTreeMap<String, String>> {
        let lists = select_first_matching(source.html.root_element(), &self.list_selectors);
        if lists.is_empty() {
            return None;
        }

        let mut fields = BTreeMap::new();
        for list in lists {
            self.collect_list(list, &mut fields);
        }

        if fields.is_empty() {
            debug!("Definition lists on {} carried no usable labels", source.context.url);
            return None;
        }

        Some(
            fields
                .into_iter()
                .map(|(key, values)| (key, values.join(VALUE_SEPARATOR)))
                .collect(),
        )
    }
}

/// `<div class="record"><span class="title">Label</span><span class="value">Value</span></div>`
pub struct FlatRecordStrategy {
    record_selectors: Vec<Selector>,
    title_selectors: Vec<Selector>,
    value_selectors: Vec<Selector>,
}

impl FlatRecordStrategy {
    pub fn new(selectors: &CaseDetailSelectors) -> ParsingResult<Self> {
        Ok(Self {
            record_selectors: compile_selectors(&selectors.record)?,
            title_selectors: compile_selectors(&selectors.record_title)?,
            value_selectors: compile_selectors(&selectors.record_value)?,
        })
    }

    /// Exactly one direct child matching `selectors`, if any
    fn single_child<'a>(record: ElementRef<'a>, selectors: &[Selector]) -> Option<ElementRef<'a>> {
        let mut matches = record
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|child| selectors.iter().any(|s| s.matches(child)));

        let first = matches.next()?;
        matches.next().is_none().then_some(first)
    }
}

impl CaseDetailsStrategy for FlatRecordStrategy {
    fn name(&self) -> &'static str {
        "flat-record"
    }

    fn extract(&self, source: &DetailSource<'_>) -> Option<BTreeMap<String, String>> {
        let records = select_first_matching(source.html.root_element(), &self.record_selectors);
        if records.is_empty() {
            return None;
        }

        let mut fields = BTreeMap::new();
        for record in records {
            let (Some(title), Some(value)) = (
                Self::single_child(record, &self.title_selectors),
                Self::single_child(record, &self.value_selectors),
            ) else {
                debug!(
                    "Skipping record without a single title/value pair on {}",
                    source.context.url
                );
                continue;
            };

            let key = normalize_key(&element_text(&title));
            if !key.is_empty() {
                fields.insert(key, element_text(&value));
            }
        }

        (!fields.is_empty()).then_some(fields)
    }
}

/// Case-details strategies in priority order
pub fn default_case_details_strategies(
    selectors: &CaseDetailSelectors,
) -> ParsingResult<Vec<Box<dyn CaseDetailsStrategy>>> {
    Ok(vec![
        Box::new(DefinitionListStrategy::new(selectors)?),
        Box::new(FlatRecordStrategy::new(selectors)?),
    ])
}
