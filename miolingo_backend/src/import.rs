//! Bulk import of `source;target` translation pairs.
//!
//! Every row is stored on its own; a failing row is reported with its line
//! number and the rest of the batch carries on.

use super::*;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// What storing one pair did to each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairOutcome {
    pub source_created: bool,
    pub target_created: bool,
}

impl PairOutcome {
    pub fn is_duplicate(&self) -> bool {
        !self.source_created && !self.target_created
    }

    pub fn new_translations(&self) -> u64 {
        self.source_created as u64 + self.target_created as u64
    }
}

/// Where imported pairs end up.
pub trait PairSink {
    fn store_pair(&self, src_lang: &str, src: &str, tgt_lang: &str, tgt: &str)
        -> Result<PairOutcome>;
}

/// Stores pairs for `owner`: both sides are found or created and then
/// linked, all in one transaction per row.
pub struct DbSink<'a> {
    pub conn: &'a PgConnection,
    pub owner: &'a User,
}

impl<'a> PairSink for DbSink<'a> {
    fn store_pair(&self, src_lang: &str, src: &str, tgt_lang: &str, tgt: &str)
        -> Result<PairOutcome>
    {
        let conn = self.conn;
        conn.transaction(|| {
            let (source, source_created) = translation::find_or_create(conn, self.owner, src_lang, src, 0)?;
            let (target, target_created) = translation::find_or_create(conn, self.owner, tgt_lang, tgt, 0)?;
            translation::add_link(conn, &source, &target)?;
            Ok(PairOutcome { source_created, target_created })
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ImportReport {
    /// Rows that brought in at least one new translation.
    pub created: u64,
    /// Rows whose both sides existed already.
    pub duplicates: u64,
    /// Translations that did not exist before.
    pub translations: u64,
    /// Line number and reason of every row that was skipped.
    pub errors: Vec<(u64, String)>,
}

fn store_row<S: PairSink>(record: &csv::StringRecord, src_lang: &str, tgt_lang: &str, sink: &S)
    -> Result<PairOutcome>
{
    match (record.get(0), record.get(1)) {
        (Some(src), Some(tgt)) if record.len() == 2 => sink.store_pair(src_lang, src, tgt_lang, tgt),
        _ => invalid("row", format!("Expected 2 columns separated by ';', found {}.", record.len())),
    }
}

pub fn import_pairs<R: Read, S: PairSink>(reader: R, src_lang: &str, tgt_lang: &str, sink: &S)
    -> Result<ImportReport>
{
    validate::lang("src", src_lang)?;
    validate::lang("tgt", tgt_lang)?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut report = ImportReport::default();

    for (idx, result) in reader.records().enumerate() {
        let fallback_line = idx as u64 + 1;

        let stored = match result {
            Ok(record) => {
                let line = record.position().map(|p| p.line()).unwrap_or(fallback_line);
                (line, store_row(&record, src_lang, tgt_lang, sink))
            }
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(fallback_line);
                (line, Err(e.into()))
            }
        };

        match stored {
            (_, Ok(outcome)) if outcome.is_duplicate() => report.duplicates += 1,
            (_, Ok(outcome)) => {
                report.created += 1;
                report.translations += outcome.new_translations();
            }
            (line, Err(e)) => {
                warn!("Skipping line {} of the import: {}", line, e);
                report.errors.push((line, e.to_string()));
            }
        }
    }

    info!("Import done: {} rows created ({} new translations), {} duplicates, {} errors.",
          report.created, report.translations, report.duplicates, report.errors.len());
    Ok(report)
}

pub fn import_file<S: PairSink>(path: &Path, src_lang: &str, tgt_lang: &str, sink: &S)
    -> Result<ImportReport>
{
    let file = File::open(path).chain_err(|| format!("Can't open {}", path.display()))?;
    import_pairs(file, src_lang, tgt_lang, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::io::Write;
    use tempdir::TempDir;

    #[derive(Default)]
    struct MemorySink {
        keys: RefCell<HashSet<(String, String)>>,
        links: RefCell<Vec<(String, String)>>,
    }

    impl MemorySink {
        fn insert(&self, lang: &str, text: &str) -> Result<bool> {
            let slug = validate::translation_text("text", text)?;
            Ok(self.keys.borrow_mut().insert((lang.to_owned(), slug)))
        }
    }

    impl PairSink for MemorySink {
        fn store_pair(&self, src_lang: &str, src: &str, tgt_lang: &str, tgt: &str)
            -> Result<PairOutcome>
        {
            let source_created = self.insert(src_lang, src)?;
            let target_created = self.insert(tgt_lang, tgt)?;
            self.links.borrow_mut().push((src.to_owned(), tgt.to_owned()));
            Ok(PairOutcome { source_created, target_created })
        }
    }

    #[test]
    fn duplicates_are_counted_not_fatal() {
        let mut data = String::new();
        for i in 0..40 {
            data.push_str(&format!("mot {};word {}\n", i, i));
        }
        data.push_str("Mot 3 ; Word 3\n");
        data.push_str("mot   7;word-7\n");

        let sink = MemorySink::default();
        let report = import_pairs(data.as_bytes(), "fr", "en", &sink).unwrap();

        assert_eq!(report.created, 40);
        assert_eq!(report.duplicates, 2);
        assert_eq!(report.translations, 80);
        assert!(report.errors.is_empty());
        assert_eq!(sink.keys.borrow().len(), 80);
        assert_eq!(sink.links.borrow()[40], ("Mot 3".to_owned(), "Word 3".to_owned()));
    }

    #[test]
    fn bad_rows_are_skipped_with_their_line() {
        let data = "chat;cat\nlonely\n?!;nothing\nchien;dog\n";

        let sink = MemorySink::default();
        let report = import_pairs(data.as_bytes(), "fr", "en", &sink).unwrap();

        assert_eq!(report.created, 2);
        assert_eq!(report.duplicates, 0);
        assert_eq!(report.translations, 4);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.errors[0].0, 2);
        assert_eq!(report.errors[1].0, 3);
    }

    #[test]
    fn unknown_language_aborts_before_reading() {
        let sink = MemorySink::default();
        let err = import_pairs("chat;cat\n".as_bytes(), "xx", "en", &sink).unwrap_err();
        assert_eq!(err.field(), Some("src"));
        assert!(sink.keys.borrow().is_empty());
    }

    #[test]
    fn imports_from_a_file() {
        let dir = TempDir::new("miolingo-import").unwrap();
        let path = dir.path().join("fr-en.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "bonjour;hello").unwrap();
        writeln!(file, "merci;thank you").unwrap();
        drop(file);

        let sink = MemorySink::default();
        let report = import_file(&path, "fr", "en", &sink).unwrap();
        assert_eq!(report.created, 2);

        assert!(import_file(&dir.path().join("missing.csv"), "fr", "en", &sink).is_err());
    }
}
