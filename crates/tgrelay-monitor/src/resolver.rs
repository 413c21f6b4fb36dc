// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Target-title resolution over the account's dialog list.
//!
//! Both the configured title and every candidate are normalized (trim,
//! lowercase, `ё`→`е`, whitespace collapse) and compared for exact equality.
//! Anything other than exactly one match is a resolution failure: zero
//! matches cannot forward anywhere, and two matches could forward to the
//! wrong destination.

use tgrelay_core::text::normalize;
use tgrelay_core::{DialogInfo, ResolutionError, ResolvedTarget};

/// Resolve the configured target title against the dialog list.
pub fn resolve_target(
    dialogs: &[DialogInfo],
    target_title: &str,
) -> Result<ResolvedTarget, ResolutionError> {
    let wanted = normalize(target_title);

    let mut matches = dialogs
        .iter()
        .filter(|dialog| normalize(&dialog.title) == wanted);

    match (matches.next(), matches.next()) {
        (Some(dialog), None) => Ok(ResolvedTarget {
            chat_id: dialog.chat_id,
            title: dialog.title.clone(),
        }),
        (None, _) => Err(ResolutionError::NotFound {
            title: target_title.trim().to_string(),
        }),
        (Some(_), Some(_)) => {
            let count = dialogs
                .iter()
                .filter(|dialog| normalize(&dialog.title) == wanted)
                .count();
            Err(ResolutionError::Ambiguous {
                title: target_title.trim().to_string(),
                count,
            })
        }
    }
}
