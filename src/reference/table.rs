use super::*;

/// Draws rows from a table block, `Nd[[note#^block]]|Column`.
///
/// A table whose first header cell is dice notation (`d6`, `1d20`, ...) is a
/// lookup table: the header is rolled and the row whose first cell covers the
/// total is selected. Other tables are drawn from uniformly.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRoller {
    notation: String,
    count: usize,
    note: String,
    block: String,
    column: Option<String>,
}

impl TableRoller {
    pub fn new(data: &str) -> Result<Self, ReferenceError> {
        let caps = captures(&TABLE, data)?;
        Ok(Self {
            notation: data.to_string(),
            count: count(&caps)?,
            note: caps[2].to_string(),
            block: caps[3].to_string(),
            column: caps.get(4).map(|m| m.as_str().trim().to_string()),
        })
    }

    fn name(&self) -> String {
        format!("[[{}#^{}]]", self.note, self.block)
    }
}

impl RollReference for TableRoller {
    fn roll<S: ContentStore + ?Sized, R: Roller + ?Sized>(
        &self,
        engine: &Engine,
        store: &S,
        roller: &mut R,
    ) -> crate::Result<ReferenceResult> {
        check_budget(engine, self.count)?;
        let table = store
            .table(&self.note, &self.block)
            .ok_or_else(|| ReferenceError::NotFound(self.name()))?;
        if table.rows.is_empty() {
            return Err(ReferenceError::Empty(self.name()).into());
        }

        let column = match &self.column {
            Some(name) => Some(table.column(name).ok_or_else(|| {
                ReferenceError::UnknownColumn {
                    table: self.name(),
                    column: name.clone(),
                }
            })?),
            None => None,
        };

        let entries = match lookup_formula(engine, &table) {
            Some(formula) => {
                let mut entries = Vec::with_capacity(self.count);
                for _ in 0..self.count {
                    let value = engine.roll_dice(formula, roller)?.total.as_int();
                    let row = table
                        .rows
                        .iter()
                        .find(|row| row.first().map_or(false, |cell| covers(cell, value)))
                        .ok_or_else(|| ReferenceError::NoRow {
                            table: self.name(),
                            value,
                        })?;
                    log::debug!("{} rolled {} on {}", self.name(), value, formula);
                    entries.push(cell_text(row, column, 1));
                }
                entries
            }
            None => draw(
                roller,
                table.rows.len(),
                self.count,
                false,
                engine.settings().table_exhaustion,
            )
            .into_iter()
            .map(|i| cell_text(&table.rows[i], column, 0))
            .collect(),
        };

        Ok(ReferenceResult {
            kind: RollerKind::Table,
            notation: self.notation.clone(),
            display: entries.join("\n"),
            entries,
        })
    }
}

/// The header formula of a lookup table.
fn lookup_formula<'t>(engine: &Engine, table: &'t Table) -> Option<&'t str> {
    let first = table.header.first()?.trim();
    if !first.starts_with(|c: char| c.is_ascii_digit() || c == 'd' || c == 'D') {
        return None;
    }
    match engine.parse(first) {
        Ok(expr) if !expr.groups().is_empty() => Some(first),
        _ => None,
    }
}

/// Whether a range cell (`3`, `4-6`, `10+`) contains `value`.
fn covers(cell: &str, value: Int) -> bool {
    let cell = cell.trim();
    if let Some(min) = cell.strip_suffix('+') {
        return min.trim().parse::<Int>().map_or(false, |min| value >= min);
    }
    if let Some((lo, hi)) = cell.split_once(['-', '–']) {
        return match (lo.trim().parse::<Int>(), hi.trim().parse::<Int>()) {
            (Ok(lo), Ok(hi)) => (lo..=hi).contains(&value),
            _ => false,
        };
    }
    cell.parse::<Int>().map_or(false, |x| x == value)
}

/// The selected column, or every cell from `skip` on joined by `|`.
fn cell_text(row: &[String], column: Option<usize>, skip: usize) -> String {
    match column {
        Some(i) => row.get(i).cloned().unwrap_or_default(),
        None => row
            .iter()
            .skip(skip)
            .map(|c| c.trim())
            .collect::<Vec<_>>()
            .join(" | "),
    }
}
