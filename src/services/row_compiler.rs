use crate::models::game::StatField;
use crate::models::stat_record::{PlayerStatRecord, RecordIssue};
use crate::services::ocr::parser::{clean_name_text, parse_stat_value};
use crate::services::ocr::recognizer::RecognizedCell;

/// Groups recognized cells into per-player records
pub struct RowCompiler<'a> {
    column_map: &'a [StatField],
}

impl<'a> RowCompiler<'a> {
    pub fn new(column_map: &'a [StatField]) -> Self {
        Self { column_map }
    }

    /// One record per `column_map.len()` cells, in order. A trailing short
    /// chunk still yields a record with the missing fields unset.
    pub fn compile(&self, cells: &[RecognizedCell]) -> Vec<PlayerStatRecord> {
        let columns = self.column_map.len();
        if columns == 0 {
            return Vec::new();
        }

        cells
            .chunks(columns)
            .map(|chunk| self.compile_row(chunk))
            .collect()
    }

    fn compile_row(&self, chunk: &[RecognizedCell]) -> PlayerStatRecord {
        // chunks() never yields an empty slice
        let first = &chunk[0];
        let mut record = PlayerStatRecord::new(first.row, first.side);
        record.raw_cells = chunk.iter().map(|c| c.text.clone()).collect();

        for (cell, &field) in chunk.iter().zip(self.column_map) {
            if !field.is_numeric() {
                record.raw_name = clean_name_text(&cell.text);
                continue;
            }

            match parse_stat_value(&cell.text) {
                Ok(value) => record.stats.set(field, value),
                Err(e) => {
                    tracing::debug!(row = record.row, ?field, raw = %e.raw, "Unparseable stat");
                    record.issues.push(RecordIssue::FieldParse { field, raw: e.raw });
                }
            }
        }

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::game::{GameTitle, Side};

    const SCENARIO_MAP: [StatField; 3] = [StatField::Name, StatField::Kills, StatField::Deaths];

    fn cells(rows: &[&[&str]]) -> Vec<RecognizedCell> {
        rows.iter()
            .enumerate()
            .flat_map(|(row, texts)| {
                texts.iter().enumerate().map(move |(column, text)| {
                    RecognizedCell::from_text(row, column, Side::of_row(row, 1), *text)
                })
            })
            .collect()
    }

    #[test]
    fn test_two_rows_compile_in_order() {
        let input = cells(&[&["TeamA PlayerOne", "10", "2"], &["TeamA PlayerTwo", "7", "5"]]);

        let records = RowCompiler::new(&SCENARIO_MAP).compile(&input);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].raw_name, "TeamA PlayerOne");
        assert_eq!(records[0].stats.kills, Some(10));
        assert_eq!(records[0].stats.deaths, Some(2));
        assert_eq!(records[1].raw_name, "TeamA PlayerTwo");
        assert_eq!(records[1].stats.kills, Some(7));
        assert_eq!(records[1].stats.deaths, Some(5));
        assert_eq!(records[1].side, Side::Right);
        assert!(records.iter().all(|r| r.issues.is_empty()));
    }

    #[test]
    fn test_record_count_is_ceiling() {
        let compiler = RowCompiler::new(&SCENARIO_MAP);
        let input: Vec<RecognizedCell> = (0..7)
            .map(|i| RecognizedCell::from_text(i / 3, i % 3, Side::Left, i.to_string()))
            .collect();

        for n in 0..=7 {
            let records = compiler.compile(&input[..n]);
            assert_eq!(records.len(), n.div_ceil(3), "n = {}", n);
            for (i, record) in records.iter().enumerate() {
                let end = ((i + 1) * 3).min(n);
                let expected: Vec<String> = input[i * 3..end].iter().map(|c| c.text.clone()).collect();
                assert_eq!(record.raw_cells, expected);
            }
        }
    }

    #[test]
    fn test_trailing_short_chunk_leaves_fields_unset() {
        let input = cells(&[&["PlayerOne", "4"]]);
        let records = RowCompiler::new(&SCENARIO_MAP).compile(&input);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].stats.kills, Some(4));
        assert_eq!(records[0].stats.deaths, None);
        assert!(records[0].issues.is_empty());
    }

    #[test]
    fn test_non_numeric_field_is_isolated() {
        let input = cells(&[&["PlayerOne", "ten", "3"]]);
        let records = RowCompiler::new(&SCENARIO_MAP).compile(&input);

        assert_eq!(records[0].stats.kills, None);
        assert_eq!(records[0].stats.deaths, Some(3));
        assert_eq!(
            records[0].issues,
            vec![RecordIssue::FieldParse {
                field: StatField::Kills,
                raw: "ten".to_string()
            }]
        );
    }

    #[test]
    fn test_misread_digit_is_reported_not_truncated() {
        let input = cells(&[&["PlayerOne", "1O", "2l"]]);
        let records = RowCompiler::new(&SCENARIO_MAP).compile(&input);

        assert_eq!(records[0].stats.kills, None);
        assert_eq!(records[0].stats.deaths, None);
        assert_eq!(
            records[0].issues,
            vec![
                RecordIssue::FieldParse {
                    field: StatField::Kills,
                    raw: "1O".to_string()
                },
                RecordIssue::FieldParse {
                    field: StatField::Deaths,
                    raw: "2l".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_name_is_cleaned() {
        let input = cells(&[&["  |PlayerX.  ", "55"]]);
        let map = [StatField::Name, StatField::Rating];
        let records = RowCompiler::new(&map).compile(&input);

        assert_eq!(records[0].raw_name, "PlayerX");
        assert_eq!(records[0].raw_cells[0], "  |PlayerX.  ");
        assert_eq!(records[0].stats.rating, Some(55));
    }

    #[test]
    fn test_full_moba_row_uses_title_map() {
        let texts = ["Hero", "3", "1", "9", "12,400", "8", "30,125", "20,000", "1,500", "0"];
        let input: Vec<RecognizedCell> = texts
            .iter()
            .enumerate()
            .map(|(column, t)| RecognizedCell::from_text(0, column, Side::Left, *t))
            .collect();

        let records = RowCompiler::new(GameTitle::Moba.column_map()).compile(&input);

        let stats = &records[0].stats;
        assert_eq!(stats.gold, Some(12_400));
        assert_eq!(stats.hero_damage, Some(30_125));
        assert_eq!(stats.tower_damage, Some(1_500));
        assert_eq!(stats.healing, Some(0));
    }

    #[test]
    fn test_empty_input() {
        assert!(RowCompiler::new(&SCENARIO_MAP).compile(&[]).is_empty());
    }
}
