//! Fixture dump shared by the integration tests.
//!
//! CSV files are generated from the table schemas, so their headers always
//! carry the upstream names (`NAF Nr`, `naf_variantsid`, ...).

#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use nafstat_sync::schema::tables::{
    AWARDS, COACH_RANKING_VARIANT, GAMES, MEMBERS, RACES, TOURNAMENTS, TOURNAMENT_COACHES,
    TOURNAMENT_STATISTICS, VARIANTS,
};
use nafstat_sync::schema::TableSchema;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Name of the data directory inside the fixture archive
pub const DATA_DIR: &str = "nafstat";

/// A row given as `(destination column, raw source value)`
pub type Row<'a> = &'a [(&'a str, &'a str)];

/// Render one source file; `extra` headers are unmapped upstream fields
pub fn table_csv(schema: &TableSchema, extra: &[&str], rows: &[Row]) -> String {
    let mut headers: Vec<&str> = schema.columns.iter().map(|c| c.source).collect();
    headers.extend_from_slice(extra);

    let mut out = headers.join(";");
    out.push('\n');
    for row in rows {
        let fields: Vec<&str> = schema
            .columns
            .iter()
            .map(|c| c.name)
            .chain(extra.iter().copied())
            .map(|name| {
                row.iter()
                    .find(|(col, _)| *col == name)
                    .map(|(_, value)| *value)
                    .unwrap_or("")
            })
            .collect();
        out.push_str(&fields.join(";"));
        out.push('\n');
    }
    out
}

/// The fixture dump: members 10000, 10005 and 10010 with everything between
/// retired, and one row of every dependent table referencing them.
pub fn fixture_files() -> Vec<(&'static str, String)> {
    vec![
        (
            RACES.source_file,
            table_csv(
                &RACES,
                &["legacy_flag"],
                &[
                    &[("raceid", "1"), ("name", "Amazon"), ("reroll_cost", "50"), ("race_order", "1"), ("legacy_flag", "x")],
                    &[("raceid", "2"), ("name", "Chaos"), ("reroll_cost", "60"), ("race_order", "2"), ("legacy_flag", "y")],
                ],
            ),
        ),
        (
            VARIANTS.source_file,
            table_csv(
                &VARIANTS,
                &[],
                &[
                    &[("variantid", "1"), ("variantname", "Blood Bowl 2020"), ("variantorder", "1")],
                    &[("variantid", "13"), ("variantname", "BB2016"), ("variantorder", "2")],
                ],
            ),
        ),
        (
            AWARDS.source_file,
            table_csv(
                &AWARDS,
                &[],
                &[&[("id", "1"), ("name", "Winner"), ("label", "W"), ("award_order", "1")]],
            ),
        ),
        (
            MEMBERS.source_file,
            table_csv(
                &MEMBERS,
                &[],
                &[
                    &[("naf_number", "10000"), ("naf_name", "Alpha"), ("country", "Norway"), ("registration_date", "2001-02-03 00:00:00"), ("expiry_date", "0000-00-00 00:00:00")],
                    &[("naf_number", "10005"), ("naf_name", "Bravo"), ("country", "France"), ("registration_date", "2005-06-07 00:00:00"), ("expiry_date", "2030-01-01 00:00:00")],
                    &[("naf_number", "10010"), ("naf_name", "Charlie"), ("registration_date", "2010-11-12 00:00:00")],
                ],
            ),
        ),
        (
            TOURNAMENTS.source_file,
            table_csv(
                &TOURNAMENTS,
                &[],
                &[&[
                    ("tournamentid", "100"),
                    ("tournamentorganizerid", "10000"),
                    ("tournamentname", "Norwegian Open"),
                    ("tournamentstartdate", "2020-01-01"),
                    ("tournamentenddate", "0000-00-00"),
                    ("variantsid", "13"),
                ]],
            ),
        ),
        (
            TOURNAMENT_STATISTICS.source_file,
            table_csv(
                &TOURNAMENT_STATISTICS,
                &[],
                &[&[("typeid", "1"), ("tournamentid", "100"), ("coachid", "10005"), ("raceid", "1"), ("date", "2020-01-02 00:00:00")]],
            ),
        ),
        (
            TOURNAMENT_COACHES.source_file,
            table_csv(
                &TOURNAMENT_COACHES,
                &[],
                &[&[("tournamentid", "100"), ("coachid", "10003"), ("raceid", "2")]],
            ),
        ),
        (GAMES.source_file, games_csv("1")),
        (
            COACH_RANKING_VARIANT.source_file,
            table_csv(
                &COACH_RANKING_VARIANT,
                &[],
                &[&[("coachid", "10000"), ("raceid", "1"), ("variantid", "13"), ("dateupdate", "2023-05-01 12:00:00"), ("ranking", "150.25")]],
            ),
        ),
    ]
}

/// One game between a live member and a retired one, on the "Deleted"
/// variant and the "Unknown" race
pub fn games_csv(gameid: &str) -> String {
    table_csv(
        &GAMES,
        &[],
        &[&[
            ("gameid", gameid),
            ("tournamentid", "100"),
            ("homecoachid", "10000"),
            ("awaycoachid", "10007"),
            ("racehome", "1"),
            ("raceaway", "0"),
            ("goalshome", "2"),
            ("goalsaway", "1"),
            ("dirty_calibrated", "0"),
            ("dirty", "1"),
            ("date", "0000-00-00 00:00:00"),
            ("variantsid", "6"),
        ]],
    )
}

/// Write the fixture into `<parent>/nafstat/` and return that directory
pub fn write_source_dir(parent: &Path) -> PathBuf {
    let root = parent.join(DATA_DIR);
    fs::create_dir_all(&root).unwrap();
    for (name, body) in fixture_files() {
        fs::write(root.join(name), body).unwrap();
    }
    root
}

/// The fixture packed the way upstream ships it
pub fn archive_bytes() -> Vec<u8> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, body) in fixture_files() {
        zip.start_file(format!("{DATA_DIR}/{name}"), SimpleFileOptions::default())
            .unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}
