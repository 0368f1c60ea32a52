//! Pull request body templates keyed by change type

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ImplflowError;

/// Kind of change a pull request carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    #[default]
    Feature,
    Bugfix,
    Docs,
    Refactor,
    Chore,
}

impl ChangeType {
    pub const ALL: [ChangeType; 5] = [
        ChangeType::Feature,
        ChangeType::Bugfix,
        ChangeType::Docs,
        ChangeType::Refactor,
        ChangeType::Chore,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::Feature => "feature",
            ChangeType::Bugfix => "bugfix",
            ChangeType::Docs => "docs",
            ChangeType::Refactor => "refactor",
            ChangeType::Chore => "chore",
        }
    }

    /// Markdown skeleton for the PR description
    pub fn template(self) -> &'static str {
        match self {
            ChangeType::Feature => FEATURE,
            ChangeType::Bugfix => BUGFIX,
            ChangeType::Docs => DOCS,
            ChangeType::Refactor => REFACTOR,
            ChangeType::Chore => CHORE,
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeType {
    type Err = ImplflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChangeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| ImplflowError::Parse {
                message: format!(
                    "unknown change type '{}' (expected one of feature, bugfix, docs, refactor, chore)",
                    s
                ),
            })
    }
}

const FEATURE: &str = "## Summary
<What this feature adds>

## Changes
- <Change>

## Motivation
<Why the feature is needed>

## Testing
- [ ] Unit tests pass
- [ ] Integration tests pass
- [ ] Feature exercised manually

## Documentation
- [ ] README updated if needed
- [ ] API docs updated if needed
";

const BUGFIX: &str = "## Problem
<Observed behaviour>

## Root Cause
<What caused it>

## Fix
<How this change resolves it>

## Testing
- [ ] Regression test added
- [ ] Fix verified
- [ ] No new failures

## Related
Fixes #<issue>
";

const DOCS: &str = "## Documentation Changes
<What was updated>

## Reason
<Why the update was needed>

## Checklist
- [ ] Spelling and grammar checked
- [ ] Links work
- [ ] Examples run
";

const REFACTOR: &str = "## Refactoring Summary
<What was restructured>

## Motivation
<Why now>

## Changes
- <Change>

## Impact
<Effect on performance or maintainability>

## Testing
- [ ] Existing tests pass
- [ ] No behaviour changes
";

const CHORE: &str = "## Changes
<What changed>

## Reason
<Why>

## Checklist
- [ ] No functional changes
- [ ] Build succeeds
";
