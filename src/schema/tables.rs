//! Table schema definitions for the NAF statistics dump

use super::types::ColumnType::{Boolean, Integer, Text, Timestamp};
use super::types::*;

// =============================================================================
// Independent Tables (rank 0, no FK dependencies)
// =============================================================================

pub static RACES: TableSchema = TableSchema {
    name: "races",
    source_file: "naf_race.csv",
    rank: 0,
    columns: &[
        Column::required("raceid", Integer),
        Column::required("name", Text),
        Column::new("reroll_cost", Integer),
        Column::new("apoth", Text),
        Column::new("race_order", Integer).header("order"),
        Column::new("selectable", Text),
        Column::new("race_count", Text),
    ],
    primary_key: &["raceid"],
    foreign_keys: &[],
    sentinels: &[&[
        ("raceid", "0"),
        ("name", "Unknown"),
        ("reroll_cost", "0"),
        ("apoth", "n"),
        ("race_order", "6"),
        ("race_count", "no"),
    ]],
    gap_fill: None,
};

pub static VARIANTS: TableSchema = TableSchema {
    name: "variants",
    source_file: "naf_variants.csv",
    rank: 0,
    columns: &[
        Column::required("variantid", Integer),
        Column::required("variantname", Text),
        Column::new("variantorder", Integer).header("order"),
    ],
    primary_key: &["variantid"],
    foreign_keys: &[],
    sentinels: &[
        &[
            ("variantid", "6"),
            ("variantname", "Deleted"),
            ("variantorder", "9998"),
        ],
        &[
            ("variantid", "0"),
            ("variantname", "Unknown"),
            ("variantorder", "9999"),
        ],
    ],
    gap_fill: None,
};

pub static AWARDS: TableSchema = TableSchema {
    name: "awards",
    source_file: "naf_tournament_statistics_list.csv",
    rank: 0,
    columns: &[
        Column::required("id", Integer),
        Column::required("name", Text),
        Column::required("label", Text),
        Column::new("award_order", Integer).header("order"),
    ],
    primary_key: &["id"],
    foreign_keys: &[],
    sentinels: &[],
    gap_fill: None,
};

pub static MEMBERS: TableSchema = TableSchema {
    name: "members",
    source_file: "CoachExport.csv",
    rank: 0,
    columns: &[
        Column::required("naf_number", Integer).header("NAF Nr"),
        Column::required("naf_name", Text).header("NAF name"),
        Column::new("country", Text).header("Country"),
        Column::required("registration_date", Timestamp).header("Registration Date"),
        Column::new("expiry_date", Timestamp).header("Expiry Date"),
    ],
    primary_key: &["naf_number"],
    foreign_keys: &[],
    sentinels: &[],
    // Historical games and tournaments keep referencing retired members.
    gap_fill: Some(GapFill {
        key: "naf_number",
        placeholder: &[
            ("naf_name", "Deleted"),
            ("country", "Deleted"),
            ("registration_date", "2000-01-01 00:00:00"),
        ],
    }),
};

// =============================================================================
// Tournaments (rank 1)
// =============================================================================

pub static TOURNAMENTS: TableSchema = TableSchema {
    name: "tournaments",
    source_file: "naf_tournament.csv",
    rank: 1,
    columns: &[
        Column::required("tournamentid", Integer),
        Column::new("tournamentorganizerid", Integer),
        Column::new("tournamentname", Text),
        Column::new("tournamentaddress1", Text),
        Column::new("tournamentaddress2", Text),
        Column::new("tournamentcity", Text),
        Column::new("tournamentstate", Text),
        Column::new("tournamentzip", Text),
        Column::new("tournamentnation", Text),
        Column::new("tournamenturl", Text),
        Column::new("tournamentnotesurl", Text),
        Column::new("tournamentstartdate", Timestamp),
        Column::new("tournamentenddate", Timestamp),
        Column::new("tournamenttype", Text),
        Column::new("tournamentstyle", Text),
        Column::new("tournamentscoring", Text),
        Column::new("tournamentcost", Text),
        Column::new("tournamentnaffee", Text),
        Column::new("tournamentnafdiscount", Text),
        Column::new("tournamentinformation", Text),
        Column::new("tournamentcontact", Text),
        Column::new("tournamentemail", Text),
        Column::new("tournamentorg", Text),
        Column::new("tournamentstatus", Text),
        Column::new("tournamentmajor", Text),
        Column::new("geolongitude", Text),
        Column::new("geolattitude", Text),
        Column::new("tournamentreport", Text),
        Column::new("subscription_closed", Text),
        Column::new("rulesetid", Integer).header("naf_rulesetid"),
        Column::new("variantsid", Integer).header("naf_variantsid"),
        Column::new("variant_notes", Text),
        Column::new("variantstatus", Text),
        Column::new("tournament_ruleset_file", Text),
    ],
    primary_key: &["tournamentid"],
    foreign_keys: &[
        ForeignKey::new("tournamentorganizerid", "members", "naf_number"),
        ForeignKey::new("variantsid", "variants", "variantid"),
    ],
    sentinels: &[],
    gap_fill: None,
};

// =============================================================================
// Tournament results (rank 2)
// =============================================================================

pub static TOURNAMENT_STATISTICS: TableSchema = TableSchema {
    name: "tournament_statistics",
    source_file: "naf_tournament_statistics_group.csv",
    rank: 2,
    columns: &[
        Column::required("typeid", Integer).header("typeID"),
        Column::required("tournamentid", Integer).header("tournamentID"),
        Column::required("coachid", Integer).header("coachID"),
        Column::new("raceid", Integer).header("raceID"),
        Column::new("notes", Text),
        Column::new("date", Timestamp),
    ],
    primary_key: &["typeid", "tournamentid", "coachid"],
    foreign_keys: &[
        ForeignKey::new("typeid", "awards", "id"),
        ForeignKey::new("tournamentid", "tournaments", "tournamentid"),
        ForeignKey::new("coachid", "members", "naf_number"),
        ForeignKey::new("raceid", "races", "raceid"),
    ],
    sentinels: &[],
    gap_fill: None,
};

pub static TOURNAMENT_COACHES: TableSchema = TableSchema {
    name: "tournament_coaches",
    source_file: "naf_tournamentcoach.csv",
    rank: 2,
    columns: &[
        Column::required("tournamentid", Integer).header("naftournament"),
        Column::required("coachid", Integer).header("nafcoach"),
        Column::required("raceid", Integer).header("race"),
    ],
    primary_key: &["tournamentid", "coachid", "raceid"],
    foreign_keys: &[
        ForeignKey::new("tournamentid", "tournaments", "tournamentid"),
        ForeignKey::new("coachid", "members", "naf_number"),
        ForeignKey::new("raceid", "races", "raceid"),
    ],
    sentinels: &[],
    gap_fill: None,
};

pub static GAMES: TableSchema = TableSchema {
    name: "games",
    source_file: "naf_game.csv",
    rank: 2,
    columns: &[
        Column::required("gameid", Integer),
        Column::new("seasonid", Integer),
        Column::new("tournamentid", Integer),
        Column::new("homecoachid", Integer),
        Column::new("awaycoachid", Integer),
        Column::new("racehome", Integer),
        Column::new("raceaway", Integer),
        Column::new("trhome", Integer),
        Column::new("traway", Integer),
        Column::new("rephome", Integer),
        Column::new("repaway", Integer),
        Column::new("rephome_calibrated", Integer),
        Column::new("repaway_calibrated", Integer),
        Column::new("dirty_calibrated", Boolean),
        Column::new("goalshome", Integer),
        Column::new("goalsaway", Integer),
        Column::new("badlyhurthome", Integer),
        Column::new("badlyhurtaway", Integer),
        Column::new("serioushome", Integer),
        Column::new("seriousaway", Integer),
        Column::new("killshome", Integer),
        Column::new("killsaway", Integer),
        Column::new("gate", Integer),
        Column::new("winningshome", Integer),
        Column::new("winningsaway", Integer),
        Column::new("notes", Text),
        Column::new("date", Timestamp),
        Column::new("dirty", Boolean),
        Column::new("hour", Integer),
        Column::new("newdate", Timestamp),
        Column::new("variantsid", Integer).header("naf_variantsid"),
    ],
    primary_key: &["gameid"],
    foreign_keys: &[
        ForeignKey::new("tournamentid", "tournaments", "tournamentid"),
        ForeignKey::new("homecoachid", "members", "naf_number"),
        ForeignKey::new("awaycoachid", "members", "naf_number"),
        ForeignKey::new("racehome", "races", "raceid"),
        ForeignKey::new("raceaway", "races", "raceid"),
        ForeignKey::new("variantsid", "variants", "variantid"),
    ],
    sentinels: &[],
    gap_fill: None,
};

pub static COACH_RANKING_VARIANT: TableSchema = TableSchema {
    name: "coach_ranking_variant",
    source_file: "naf_coachranking_variant.csv",
    rank: 2,
    columns: &[
        Column::required("coachid", Integer).header("coachID"),
        Column::required("raceid", Integer).header("raceID"),
        Column::required("variantid", Integer).header("variantID"),
        Column::new("dateupdate", Timestamp).header("dateUpdate"),
        // Upstream DECIMAL, kept verbatim
        Column::new("ranking", Text),
        Column::new("ranking_temp", Text),
    ],
    primary_key: &["coachid", "raceid", "variantid"],
    foreign_keys: &[
        ForeignKey::new("coachid", "members", "naf_number"),
        ForeignKey::new("raceid", "races", "raceid"),
        ForeignKey::new("variantid", "variants", "variantid"),
    ],
    sentinels: &[],
    gap_fill: None,
};

// =============================================================================
// Table Registry
// =============================================================================

/// All tables in load order
pub static ALL_TABLES: &[&TableSchema] = &[
    &RACES,
    &VARIANTS,
    &AWARDS,
    &MEMBERS,
    &TOURNAMENTS,
    &TOURNAMENT_STATISTICS,
    &TOURNAMENT_COACHES,
    &GAMES,
    &COACH_RANKING_VARIANT,
];

/// Get table by name
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    ALL_TABLES.iter().find(|t| t.name == name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_keys_are_columns() {
        for table in ALL_TABLES {
            for key in table.primary_key {
                assert!(
                    table.column_index(key).is_some(),
                    "{}: primary key column {} missing",
                    table.name,
                    key
                );
            }
        }
    }

    #[test]
    fn test_foreign_keys_resolve() {
        for table in ALL_TABLES {
            for fk in table.foreign_keys {
                assert!(table.column_index(fk.column).is_some());
                let parent = get_table(fk.references_table)
                    .unwrap_or_else(|| panic!("{} -> {}", table.name, fk.references_table));
                assert_eq!(parent.primary_key, &[fk.references_column]);
            }
        }
    }

    #[test]
    fn test_templates_name_existing_columns() {
        for table in ALL_TABLES {
            let templates = table
                .sentinels
                .iter()
                .copied()
                .chain(table.gap_fill.iter().map(|g| g.placeholder));
            for template in templates {
                for (column, _) in template {
                    assert!(table.column_index(column).is_some(), "{}.{}", table.name, column);
                }
            }
        }
    }

    #[test]
    fn test_source_headers_are_unique() {
        for table in ALL_TABLES {
            let mut headers: Vec<_> = table.columns.iter().map(|c| c.source).collect();
            headers.sort_unstable();
            headers.dedup();
            assert_eq!(headers.len(), table.columns.len(), "{}", table.name);
        }
    }

    #[test]
    fn test_renamed_headers() {
        let naf_number = &MEMBERS.columns[0];
        assert_eq!(naf_number.name, "naf_number");
        assert_eq!(naf_number.source, "NAF Nr");

        let coach = &TOURNAMENT_COACHES.columns[1];
        assert_eq!(coach.source, "nafcoach");
        assert_eq!(GAMES.columns.len(), 31);
        assert_eq!(TOURNAMENTS.columns.len(), 34);
    }
}
