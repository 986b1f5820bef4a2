//! One-shot commands: fetch or generate, print, exit.

use anyhow::Context;

use blindhour_core::types::ContestStatus;
use blindhour_core::{
    RevealInput, StandingsSnapshot, StandingsSource, SubmissionSource, reconstruct, standings_at,
};
use blindhour_sim::generate;
use blindhour_source_codeforces::CodeforcesClient;

use crate::cli::{ReplayOpts, SampleOpts};
use crate::print_json;

pub async fn cmd_reveal(
    client: &CodeforcesClient,
    contest_id: u64,
    freeze_minutes: u32,
) -> anyhow::Result<()> {
    let data = client
        .fetch_standings(contest_id)
        .await
        .with_context(|| format!("fetching standings of contest {contest_id}"))?;
    let submissions = client
        .fetch_submissions(contest_id)
        .await
        .with_context(|| format!("fetching submissions of contest {contest_id}"))?;

    let payload = reconstruct(
        RevealInput {
            contest: &data.contest,
            problems: &data.problems,
            rows: &data.rows,
            submissions: &submissions,
        },
        u64::from(freeze_minutes) * 60,
    );
    tracing::info!(
        "{} contestants, {} blind-hour submissions ({} accepted)",
        payload.contestants.len(),
        payload.blind_hour_submissions.len(),
        payload.accepted_blind_hour_count()
    );
    print_json(&payload, false)
}

pub async fn cmd_replay(client: &CodeforcesClient, opts: ReplayOpts) -> anyhow::Result<()> {
    let id = opts.contest_id;
    let data = client
        .fetch_standings(id)
        .await
        .with_context(|| format!("fetching standings of contest {id}"))?;
    let submissions = client
        .fetch_submissions(id)
        .await
        .with_context(|| format!("fetching submissions of contest {id}"))?;

    let contestants = standings_at(&submissions, &data.rows, &data.problems, opts.at);
    let phase = ContestStatus::at_offset(
        opts.at,
        u64::from(opts.freeze_minutes) * 60,
        data.contest.duration_seconds,
    );
    tracing::info!("replayed contest {id} to {}s ({phase:?})", opts.at);
    let board = StandingsSnapshot::replayed(
        &data.contest,
        data.problems.as_slice(),
        contestants,
        phase,
        opts.at,
    );
    print_json(&board, false)
}

pub fn cmd_sample(opts: SampleOpts) -> anyhow::Result<()> {
    let dataset = generate(opts.params.into());
    tracing::info!(
        "sample: {} contestants, {} submissions, {} blind-hour events",
        dataset.rows.len(),
        dataset.submissions.len(),
        dataset.reveal.blind_hour_submissions.len()
    );
    print_json(&dataset, opts.pretty)
}
