use std::{
    collections::{
        BTreeSet,
        HashSet,
    },
    time::Instant,
};

use tracing::{
    info,
    warn,
};

use crate::core::{
    Credential,
    KnownVocabulary,
};

pub mod api;
pub mod credential;
pub mod pagination;
pub mod types;

use api::{
    ApiTransport,
    Endpoints,
};
use pagination::fetch_all_pages;
use types::{
    Assignment,
    Page,
    Subject,
    SubjectKind,
};

pub const SRS_STAGE_FLOOR: u8 = 5;
pub const KNOWN_SUBJECT_KINDS: &[SubjectKind] = &[SubjectKind::Kanji, SubjectKind::Vocabulary];

/// Same policy as the `srs_stages`/`subject_types` query filter on the assignments request.
pub fn is_known_assignment(assignment: &Assignment) -> bool {
    assignment.srs_stage >= SRS_STAGE_FLOOR && KNOWN_SUBJECT_KINDS.contains(&assignment.subject_type)
}

pub async fn collect_known_subject_ids(
    transport: &impl ApiTransport,
    endpoints: &Endpoints,
    credential: &Credential,
) -> (BTreeSet<u64>, bool) {
    let mut ids = BTreeSet::new();
    let summary =
        fetch_all_pages(transport, &endpoints.assignments(), credential, |page: Page<Assignment>| {
            ids.extend(
                page.data
                    .into_iter()
                    .map(|resource| resource.data)
                    .filter(is_known_assignment)
                    .map(|assignment| assignment.subject_id),
            );
        })
        .await;

    (ids, summary.complete)
}

pub async fn collect_subject_slugs(
    transport: &impl ApiTransport,
    endpoints: &Endpoints,
    credential: &Credential,
    ids: &BTreeSet<u64>,
    batch_size: usize,
) -> (HashSet<String>, bool) {
    let ids: Vec<u64> = ids.iter().copied().collect();
    let mut slugs = HashSet::new();
    let mut complete = true;

    for batch in ids.chunks(batch_size.max(1)) {
        let summary =
            fetch_all_pages(transport, &endpoints.subjects(batch), credential, |page: Page<Subject>| {
                slugs.extend(page.data.into_iter().map(|resource| resource.data.slug));
            })
            .await;
        complete &= summary.complete;
    }

    (slugs, complete)
}

/// Builds the set of kanji and vocabulary the user has reached Guru or higher on.
pub async fn resolve_known_vocabulary(
    transport: &impl ApiTransport,
    endpoints: &Endpoints,
    credential: &Credential,
    batch_size: usize,
) -> KnownVocabulary {
    let start = Instant::now();

    let (ids, assignments_complete) =
        collect_known_subject_ids(transport, endpoints, credential).await;
    info!(
        "Found {} known subjects in assignments ({:.1}s)",
        ids.len(),
        start.elapsed().as_secs_f32()
    );

    let (slugs, subjects_complete) =
        collect_subject_slugs(transport, endpoints, credential, &ids, batch_size).await;

    let known = KnownVocabulary::new(slugs, assignments_complete && subjects_complete);
    if !known.is_complete() {
        warn!("WaniKani data is incomplete; some known words may keep their furigana");
    }
    info!(
        "Loaded {} known words from WaniKani ({:.1}s)",
        known.len(),
        start.elapsed().as_secs_f32()
    );
    known
}
