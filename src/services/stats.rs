use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::services::table::EventRecord;

/// League categories, mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Top flight and European competition.
    BblEuro,
    ProB,
    Other,
}

struct Rule {
    category: Category,
    pattern: Regex,
    /// A match directly preceded by one of these characters does not count
    /// (`NBBL`, `JBBL`, `RBBL` are youth and regional leagues).
    excluded_prefixes: &'static [char],
}

impl Rule {
    fn matches(&self, league: &str) -> bool {
        self.pattern.find_iter(league).any(|m| {
            league[..m.start()]
                .chars()
                .next_back()
                .map_or(true, |c| !self.excluded_prefixes.contains(&c))
        })
    }
}

static RULES: OnceLock<Vec<Rule>> = OnceLock::new();

fn rules() -> &'static [Rule] {
    RULES.get_or_init(|| {
        let rule = |category: Category, pattern: &str, excluded_prefixes: &'static [char]| Rule {
            category,
            pattern: Regex::new(pattern).unwrap_or_else(|e| {
                panic!("invalid league pattern {}: {}", pattern, e);
            }),
            excluded_prefixes,
        };
        vec![
            rule(Category::BblEuro, "BBL", &['R', 'N', 'J']),
            rule(Category::BblEuro, "Euro", &[]),
            rule(Category::ProB, "ProB", &[]),
        ]
    })
}

/// First matching rule wins; anything unmatched is `Other`.
pub fn categorize(league: &str) -> Category {
    rules()
        .iter()
        .find(|r| r.matches(league))
        .map_or(Category::Other, |r| r.category)
}

/// Assignment counts for one scouter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsRow {
    pub name: String,
    pub c1: u32,
    pub c2: u32,
    pub c3: u32,
    pub total: u32,
}

impl StatsRow {
    fn new(name: String) -> Self {
        StatsRow {
            name,
            c1: 0,
            c2: 0,
            c3: 0,
            total: 0,
        }
    }

    fn add(&mut self, category: Category) {
        match category {
            Category::BblEuro => self.c1 += 1,
            Category::ProB => self.c2 += 1,
            Category::Other => self.c3 += 1,
        }
        self.total += 1;
    }
}

/// One row per known name in the given order, followed by rows for scouters
/// that appear on events but are not in `names`, in order of appearance.
pub fn compute(records: &[EventRecord], names: &[String]) -> Vec<StatsRow> {
    let mut rows: Vec<StatsRow> = names.iter().cloned().map(StatsRow::new).collect();
    let mut index: HashMap<String, usize> = names
        .iter()
        .enumerate()
        .map(|(i, n)| (n.clone(), i))
        .collect();

    for record in records {
        let category = categorize(&record.league);
        for scouter in record.scouters.iter().filter(|s| !s.is_empty()) {
            let i = *index.entry(scouter.clone()).or_insert_with(|| {
                rows.push(StatsRow::new(scouter.clone()));
                rows.len() - 1
            });
            rows[i].add(category);
        }
    }

    rows
}
