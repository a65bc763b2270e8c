use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("file did not contain a header row")]
    MissingHeader,

    #[error("no data row had at least {expected} columns ({dropped} rows dropped)")]
    NoQualifyingRows { expected: usize, dropped: usize },

    #[error("CSV error on line {line}: {source}")]
    Csv {
        line: u64,
        #[source]
        source: csv::Error,
    },
}
