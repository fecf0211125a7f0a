use crate::error::{LoadError, LoadResult};
use crate::models::{Config, DataSourceMode, MedalRecord};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Columns every medal table must carry, with the header aliases we accept.
const REQUIRED_COLUMNS: [(&str, &[&str]); 6] = [
    ("NOC", &["Country"]),
    ("Competitions", &["Competition"]),
    ("Gold", &[]),
    ("Silver", &[]),
    ("Bronze", &[]),
    ("Total", &[]),
];

pub struct MedalLoader {
    client: reqwest::Client,
    validate_totals: bool,
}

impl MedalLoader {
    pub fn new(validate_totals: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            validate_totals,
        }
    }

    /// Load the full medal table from whatever source the configuration selects.
    pub async fn load_from_config(&self, config: &Config) -> LoadResult<Vec<MedalRecord>> {
        match config.data_source_mode {
            DataSourceMode::Local => {
                let file = config.data_file.as_deref().ok_or(LoadError::Unconfigured("data_file"))?;
                self.load_file(file)
            }
            DataSourceMode::Internet => {
                let url = config.data_url.as_deref().ok_or(LoadError::Unconfigured("data_url"))?;
                self.load_url(url).await
            }
            DataSourceMode::Both => {
                let file = config.data_file.as_deref().ok_or(LoadError::Unconfigured("data_file"))?;
                if Path::new(file).exists() {
                    debug!(file, "using local copy of the medal table");
                    return self.load_file(file);
                }

                let url = config.data_url.as_deref().ok_or(LoadError::Unconfigured("data_url"))?;
                let content = self.fetch_url(url).await?;
                let records = self.parse_csv_content(&content, url)?;

                if let Some(parent) = Path::new(file).parent() {
                    fs::create_dir_all(parent).map_err(|e| LoadError::io(parent.display().to_string(), e))?;
                }
                fs::write(file, &content).map_err(|e| LoadError::io(file, e))?;
                info!(file, "saved downloaded medal table for later runs");

                Ok(records)
            }
        }
    }

    pub fn load_file(&self, file_path: &str) -> LoadResult<Vec<MedalRecord>> {
        info!(file = file_path, "reading medal table");
        let content = fs::read_to_string(file_path).map_err(|e| LoadError::io(file_path, e))?;
        self.parse_csv_content(&content, file_path)
    }

    pub async fn load_url(&self, url: &str) -> LoadResult<Vec<MedalRecord>> {
        let content = self.fetch_url(url).await?;
        self.parse_csv_content(&content, url)
    }

    async fn fetch_url(&self, url: &str) -> LoadResult<String> {
        info!(url, "fetching medal table");

        let response = self
            .client
            .get(url)
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await
            .map_err(|source| LoadError::Http {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(LoadError::HttpStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }

        response.text().await.map_err(|source| LoadError::Http {
            url: url.to_string(),
            source,
        })
    }

    pub fn parse_csv_content(&self, content: &str, source: &str) -> LoadResult<Vec<MedalRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| LoadError::Csv {
                source_name: source.to_string(),
                line: 1,
                source: e,
            })?
            .clone();

        for (column, aliases) in REQUIRED_COLUMNS {
            let present = headers
                .iter()
                .any(|header| header == column || aliases.contains(&header));
            if !present {
                return Err(LoadError::missing_column(source, column));
            }
        }

        let mut records = Vec::new();
        let mut inconsistent = 0usize;

        for row in reader.records() {
            let row = row.map_err(|e| LoadError::Csv {
                source_name: source.to_string(),
                line: e.position().map(|p| p.line()).unwrap_or(0),
                source: e,
            })?;
            let line = row.position().map(|p| p.line()).unwrap_or(0);

            let record: MedalRecord = row.deserialize(Some(&headers)).map_err(|e| LoadError::Csv {
                source_name: source.to_string(),
                line,
                source: e,
            })?;

            if !record.has_consistent_total() {
                let computed = record.medal_sum();
                if self.validate_totals {
                    return Err(LoadError::TotalMismatch {
                        source_name: source.to_string(),
                        line,
                        noc: record.noc,
                        competition: record.competition,
                        reported: record.total,
                        computed,
                    });
                }
                warn!(
                    line,
                    noc = %record.noc,
                    competition = %record.competition,
                    reported = record.total,
                    computed,
                    "total does not match gold+silver+bronze"
                );
                inconsistent += 1;
            }

            records.push(record);
        }

        info!(source, rows = records.len(), inconsistent, "medal table loaded");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
NOC,Competitions,Gold,Silver,Bronze,Total
United States,Athletics,14,11,9,34
China,Diving,8,2,1,11
\"Côte d'Ivoire\",Athletics,0,0,1,1
";

    #[test]
    fn parses_well_formed_table() {
        let loader = MedalLoader::new(true);
        let records = loader.parse_csv_content(SAMPLE, "sample").unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0], MedalRecord::new("United States", "Athletics", 14, 11, 9));
        assert_eq!(records[2].noc, "Côte d'Ivoire");
        assert_eq!(records[2].country(), "Cte dIvoire");
    }

    #[test]
    fn accepts_header_aliases_and_extra_columns() {
        let content = "Rank,Country,Competition,Gold,Silver,Bronze,Total\n1, France , Judo ,2,2,4,8\n";
        let loader = MedalLoader::new(true);
        let records = loader.parse_csv_content(content, "aliases").unwrap();

        assert_eq!(records, vec![MedalRecord::new("France", "Judo", 2, 2, 4)]);
    }

    #[test]
    fn missing_column_is_a_load_failure() {
        let content = "NOC,Competitions,Gold,Silver,Total\nFrance,Judo,2,2,4\n";
        let loader = MedalLoader::new(true);
        let err = loader.parse_csv_content(content, "broken").unwrap_err();

        match err {
            LoadError::MissingColumn { column, .. } => assert_eq!(column, "Bronze"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_column_is_detected_without_rows() {
        let loader = MedalLoader::new(true);
        let err = loader.parse_csv_content("NOC,Gold,Silver,Bronze,Total\n", "empty").unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { .. }));
    }

    #[test]
    fn negative_counts_fail_to_parse() {
        let content = "NOC,Competitions,Gold,Silver,Bronze,Total\nFrance,Judo,-1,2,4,5\n";
        let loader = MedalLoader::new(true);
        let err = loader.parse_csv_content(content, "negative").unwrap_err();

        match err {
            LoadError::Csv { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn mismatched_total_fails_when_validating() {
        let content = "NOC,Competitions,Gold,Silver,Bronze,Total\nFrance,Judo,2,2,4,8\nJapan,Judo,3,2,4,10\n";
        let err = MedalLoader::new(true).parse_csv_content(content, "totals").unwrap_err();

        match err {
            LoadError::TotalMismatch { line, reported, computed, .. } => {
                assert_eq!(line, 3);
                assert_eq!(reported, 10);
                assert_eq!(computed, 9);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn counts_near_u32_max_fail_the_totals_check_instead_of_overflowing() {
        let content = "NOC,Competitions,Gold,Silver,Bronze,Total\nFrance,Judo,4294967295,1,0,0\n";
        let err = MedalLoader::new(true).parse_csv_content(content, "huge").unwrap_err();

        match err {
            LoadError::TotalMismatch { line, reported, computed, .. } => {
                assert_eq!(line, 2);
                assert_eq!(reported, 0);
                assert_eq!(computed, u64::from(u32::MAX) + 1);
            }
            other => panic!("unexpected error: {other}"),
        }

        let records = MedalLoader::new(false).parse_csv_content(content, "huge").unwrap();
        assert_eq!(records[0].gold, u32::MAX);
    }

    #[test]
    fn mismatched_total_is_kept_when_permissive() {
        let content = "NOC,Competitions,Gold,Silver,Bronze,Total\nJapan,Judo,3,2,4,10\n";
        let records = MedalLoader::new(false).parse_csv_content(content, "totals").unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total, 10);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = MedalLoader::new(true).load_file("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[tokio::test]
    async fn both_mode_prefers_existing_local_copy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("medals.csv");
        fs::write(&path, SAMPLE).unwrap();

        let config = Config {
            data_source_mode: DataSourceMode::Both,
            data_file: Some(path.to_str().unwrap().to_string()),
            data_url: Some("http://127.0.0.1:9/unreachable.csv".to_string()),
            ..Config::default()
        };

        let records = MedalLoader::new(true).load_from_config(&config).await.unwrap();
        assert_eq!(records.len(), 3);
    }

    /// Serves `body` once over plain HTTP/1.1 and returns the URL to fetch it from.
    async fn serve_once(body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request: Vec<u8> = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{addr}/medals.csv")
    }

    #[tokio::test]
    async fn both_mode_downloads_and_saves_missing_local_copy() {
        let url = serve_once(SAMPLE).await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("medals.csv");

        let config = Config {
            data_source_mode: DataSourceMode::Both,
            data_file: Some(path.to_str().unwrap().to_string()),
            data_url: Some(url),
            ..Config::default()
        };
        let loader = MedalLoader {
            client: reqwest::Client::builder().no_proxy().build().unwrap(),
            validate_totals: true,
        };

        let records = loader.load_from_config(&config).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1], MedalRecord::new("China", "Diving", 8, 2, 1));
        assert_eq!(fs::read_to_string(&path).unwrap(), SAMPLE);

        // The saved copy now satisfies the next run without the server.
        let again = loader.load_from_config(&config).await.unwrap();
        assert_eq!(again, records);
    }

    #[tokio::test]
    async fn local_mode_without_file_is_unconfigured() {
        let config = Config {
            data_source_mode: DataSourceMode::Local,
            data_file: None,
            ..Config::default()
        };

        let err = MedalLoader::new(true).load_from_config(&config).await.unwrap_err();
        assert!(matches!(err, LoadError::Unconfigured("data_file")));
    }
}
