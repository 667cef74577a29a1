use super::*;

/// Draws sections from the notes carrying a tag, `Nd#tag|-|kind,kind`.
#[derive(Debug, Clone, PartialEq)]
pub struct TagRoller {
    notation: String,
    count: usize,
    tag: String,
    kinds: Vec<String>,
}

impl TagRoller {
    pub fn new(data: &str) -> Result<Self, ReferenceError> {
        let caps = captures(&TAG, data)?;
        Ok(Self {
            notation: data.to_string(),
            count: count(&caps)?,
            tag: caps[2].to_string(),
            kinds: kinds(caps.get(4).map(|m| m.as_str())),
        })
    }
}

impl RollReference for TagRoller {
    fn roll<S: ContentStore + ?Sized, R: Roller + ?Sized>(
        &self,
        engine: &Engine,
        store: &S,
        roller: &mut R,
    ) -> crate::Result<ReferenceResult> {
        let settings = engine.settings();
        let notes = store
            .tagged(&self.tag)
            .ok_or_else(|| ReferenceError::NotFound(self.tag.clone()))?;
        if notes.is_empty() {
            return Err(ReferenceError::Empty(self.tag.clone()).into());
        }

        let mut entries = Vec::new();
        if settings.return_all_tags {
            check_budget(engine, notes.len())?;
            for note in &notes {
                let sections = filter_kinds(store.sections(note).unwrap_or_default(), &self.kinds);
                if sections.is_empty() {
                    log::warn!("{} has nothing to roll for {}", note, self.tag);
                    continue;
                }
                let index = draw(roller, sections.len(), 1, false, settings.table_exhaustion);
                entries.extend(index.into_iter().map(|i| sections[i].text.clone()));
            }
        } else {
            check_budget(engine, self.count)?;
            let pool: Vec<Section> = notes
                .iter()
                .flat_map(|note| filter_kinds(store.sections(note).unwrap_or_default(), &self.kinds))
                .collect();
            entries = draw(
                roller,
                pool.len(),
                self.count,
                false,
                settings.table_exhaustion,
            )
            .into_iter()
            .map(|i| pool[i].text.clone())
            .collect();
        }

        if entries.is_empty() {
            return Err(ReferenceError::Empty(self.tag.clone()).into());
        }
        Ok(ReferenceResult {
            kind: RollerKind::Tag,
            notation: self.notation.clone(),
            display: entries.join("\n\n"),
            entries,
        })
    }
}

/// Draws links to the notes carrying a tag, `Nd#tag|+`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkRoller {
    notation: String,
    count: usize,
    tag: String,
}

impl LinkRoller {
    pub fn new(data: &str) -> Result<Self, ReferenceError> {
        let caps = captures(&TAG, data)?;
        Ok(Self {
            notation: data.to_string(),
            count: count(&caps)?,
            tag: caps[2].to_string(),
        })
    }
}

impl RollReference for LinkRoller {
    fn roll<S: ContentStore + ?Sized, R: Roller + ?Sized>(
        &self,
        engine: &Engine,
        store: &S,
        roller: &mut R,
    ) -> crate::Result<ReferenceResult> {
        check_budget(engine, self.count)?;
        let notes = store
            .tagged(&self.tag)
            .ok_or_else(|| ReferenceError::NotFound(self.tag.clone()))?;
        if notes.is_empty() {
            return Err(ReferenceError::Empty(self.tag.clone()).into());
        }

        let entries: Vec<String> = draw(
            roller,
            notes.len(),
            self.count,
            false,
            engine.settings().table_exhaustion,
        )
        .into_iter()
        .map(|i| format!("[[{}]]", notes[i]))
        .collect();

        Ok(ReferenceResult {
            kind: RollerKind::Link,
            notation: self.notation.clone(),
            display: entries.join("\n"),
            entries,
        })
    }
}
