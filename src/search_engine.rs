/*!
 * Account search and filtering.
 *
 * Search runs in two stages:
 * - exact: ID (when the keyword parses as a number), username and email
 *   lookups through the directory indices; all three are tried
 * - partial: substring match on the stringified ID, username and email,
 *   scanning every account
 *
 * The partial stage only runs when the exact stage found nothing.
 */

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::directory::{Account, AccountDirectory};
use crate::ids::AccountId;

/// Which stage produced the results
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum MatchType {
    #[serde(rename = "exact")]
    Exact,
    #[serde(rename = "partial")]
    Partial,
    #[serde(rename = "none")]
    None,
}

/// Search outcome, accounts ascending by ID
#[derive(Debug, Serialize)]
pub struct SearchResult<'a> {
    pub match_type: MatchType,
    pub accounts: Vec<&'a Account>,
}

pub fn search<'a>(directory: &'a AccountDirectory, keyword: &str) -> SearchResult<'a> {
    if keyword.is_empty() {
        return SearchResult {
            match_type: MatchType::None,
            accounts: Vec::new(),
        };
    }

    let mut hits: BTreeMap<AccountId, &'a Account> = BTreeMap::new();
    if let Ok(id) = keyword.parse::<AccountId>() {
        if let Some(account) = directory.find_by_id(id) {
            hits.insert(account.id(), account);
        }
    }
    if let Some(account) = directory.find_by_username(keyword) {
        hits.insert(account.id(), account);
    }
    if let Some(account) = directory.find_by_email(keyword) {
        hits.insert(account.id(), account);
    }
    if !hits.is_empty() {
        return SearchResult {
            match_type: MatchType::Exact,
            accounts: hits.into_values().collect(),
        };
    }

    let accounts = directory.filter_by(|account| {
        account.id().to_string().contains(keyword)
            || account.username().contains(keyword)
            || account.email().contains(keyword)
    });
    let match_type = if accounts.is_empty() {
        MatchType::None
    } else {
        MatchType::Partial
    };
    SearchResult { match_type, accounts }
}

/// Predicates for `AccountDirectory::filter`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccountFilter {
    #[serde(rename = "active")]
    Active,
    #[serde(rename = "inactive")]
    Inactive,
    #[serde(rename = "with-tasks")]
    HasTasks,
    #[serde(rename = "without-tasks")]
    HasNoTasks,
}

impl AccountFilter {
    pub const ALL: [AccountFilter; 4] = [
        AccountFilter::Active,
        AccountFilter::Inactive,
        AccountFilter::HasTasks,
        AccountFilter::HasNoTasks,
    ];

    pub fn matches(&self, account: &Account) -> bool {
        match self {
            AccountFilter::Active => account.is_active(),
            AccountFilter::Inactive => !account.is_active(),
            AccountFilter::HasTasks => !account.tasks().is_empty(),
            AccountFilter::HasNoTasks => account.tasks().is_empty(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountFilter::Active => "active",
            AccountFilter::Inactive => "inactive",
            AccountFilter::HasTasks => "with-tasks",
            AccountFilter::HasNoTasks => "without-tasks",
        }
    }
}

impl fmt::Display for AccountFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountFilter::ALL
            .into_iter()
            .find(|filter| filter.as_str() == s)
            .ok_or_else(|| format!("unknown filter `{}`", s))
    }
}
