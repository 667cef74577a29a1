use super::*;

/// Draws whole sections of a note, `Nd[[note]]|kind,kind`.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionRoller {
    notation: String,
    count: usize,
    note: String,
    kinds: Vec<String>,
}

impl SectionRoller {
    pub fn new(data: &str) -> Result<Self, ReferenceError> {
        let caps = captures(&SECTION, data)?;
        Ok(Self {
            notation: data.to_string(),
            count: count(&caps)?,
            note: caps[2].to_string(),
            kinds: kinds(caps.get(3).map(|m| m.as_str())),
        })
    }
}

impl RollReference for SectionRoller {
    fn roll<S: ContentStore + ?Sized, R: Roller + ?Sized>(
        &self,
        engine: &Engine,
        store: &S,
        roller: &mut R,
    ) -> crate::Result<ReferenceResult> {
        check_budget(engine, self.count)?;
        let sections = store
            .sections(&self.note)
            .ok_or_else(|| ReferenceError::NotFound(format!("[[{}]]", self.note)))?;
        let sections = filter_kinds(sections, &self.kinds);
        if sections.is_empty() {
            return Err(ReferenceError::Empty(format!("[[{}]]", self.note)).into());
        }

        let entries: Vec<String> = draw(
            roller,
            sections.len(),
            self.count,
            false,
            engine.settings().table_exhaustion,
        )
        .into_iter()
        .map(|i| sections[i].text.clone())
        .collect();

        Ok(ReferenceResult {
            kind: RollerKind::Section,
            notation: self.notation.clone(),
            display: entries.join("\n\n"),
            entries,
        })
    }
}

/// Draws single non-empty lines of a note, `Nd[[note]]|line`.
#[derive(Debug, Clone, PartialEq)]
pub struct LineRoller {
    notation: String,
    count: usize,
    note: String,
}

impl LineRoller {
    pub fn new(data: &str) -> Result<Self, ReferenceError> {
        let caps = captures(&SECTION, data)?;
        Ok(Self {
            notation: data.to_string(),
            count: count(&caps)?,
            note: caps[2].to_string(),
        })
    }
}

impl RollReference for LineRoller {
    fn roll<S: ContentStore + ?Sized, R: Roller + ?Sized>(
        &self,
        engine: &Engine,
        store: &S,
        roller: &mut R,
    ) -> crate::Result<ReferenceResult> {
        check_budget(engine, self.count)?;
        let lines = store
            .lines(&self.note)
            .ok_or_else(|| ReferenceError::NotFound(format!("[[{}]]", self.note)))?;
        if lines.is_empty() {
            return Err(ReferenceError::Empty(format!("[[{}]]", self.note)).into());
        }

        let entries: Vec<String> = draw(
            roller,
            lines.len(),
            self.count,
            false,
            engine.settings().table_exhaustion,
        )
        .into_iter()
        .map(|i| lines[i].clone())
        .collect();

        Ok(ReferenceResult {
            kind: RollerKind::Line,
            notation: self.notation.clone(),
            display: entries.join("\n"),
            entries,
        })
    }
}
