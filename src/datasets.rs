//! Loaders for flat delimited ratings files, metadata tables, and trust
//! statements, plus built-in dataset downloads for easy experimentation.
use std::fs;
use std::path::Path;

use csv;
use failure;

use data::{IdIndex, Interaction, Interactions};
use trust::TrustStatement;
use Timestamp;

/// Dataset error types.
#[derive(Debug, Fail)]
pub enum DatasetError {
    /// Can't find the home directory.
    #[fail(display = "Cannot find home directory.")]
    NoHomeDir,
    /// A row of the input file could not be parsed.
    #[fail(display = "Malformed input at line {}: {}", line, message)]
    MalformedLine {
        /// 1-based line number of the offending row.
        line: usize,
        /// What went wrong.
        message: String,
    },
}

/// The result of loading a ratings file: interactions over a dense index
/// space, together with the raw-to-dense id mappings that produced it.
#[derive(Debug)]
pub struct RatingsDataset {
    /// The loaded interactions.
    pub interactions: Interactions,
    /// Mapping from raw user ids to dense user indices.
    pub user_index: IdIndex,
    /// Mapping from raw item ids to dense item indices.
    pub item_index: IdIndex,
}

fn densify(rows: Vec<(u32, u32, f32, Timestamp)>) -> RatingsDataset {
    let mut user_index = IdIndex::new();
    let mut item_index = IdIndex::new();

    let interactions: Vec<Interaction> = rows
        .into_iter()
        .map(|(user, item, rating, timestamp)| {
            Interaction::new(
                user_index.get_or_assign(user),
                item_index.get_or_assign(item),
                rating,
                timestamp,
            )
        })
        .collect();

    RatingsDataset {
        interactions: Interactions::from(interactions),
        user_index,
        item_index,
    }
}

fn malformed(line: usize, message: &str) -> DatasetError {
    DatasetError::MalformedLine {
        line,
        message: message.to_owned(),
    }
}

fn split_double_colon(line: &str, line_number: usize, num_fields: usize) -> Result<Vec<&str>, DatasetError> {
    let fields: Vec<&str> = line.split("::").collect();

    if fields.len() != num_fields {
        return Err(malformed(
            line_number,
            &format!("expected {} ::-separated fields, got {}", num_fields, fields.len()),
        ));
    }

    Ok(fields)
}

/// Read a MovieLens-style ratings file of `uid::mid::rating::timestamp`
/// rows, remapping raw ids to dense indices in first-appearance order.
pub fn read_movielens_ratings<P: AsRef<Path>>(path: P) -> Result<RatingsDataset, failure::Error> {
    // The ml-1m files are latin-1 encoded.
    let bytes = fs::read(path)?;
    let contents = String::from_utf8_lossy(&bytes);

    let mut rows = Vec::new();

    for (idx, line) in contents.lines().enumerate() {
        if line.is_empty() {
            continue;
        }

        let line_number = idx + 1;
        let fields = split_double_colon(line, line_number, 4)?;

        let user: u32 = fields[0]
            .parse()
            .map_err(|_| malformed(line_number, "invalid user id"))?;
        let item: u32 = fields[1]
            .parse()
            .map_err(|_| malformed(line_number, "invalid item id"))?;
        let rating: f32 = fields[2]
            .parse()
            .map_err(|_| malformed(line_number, "invalid rating"))?;
        let timestamp: Timestamp = fields[3]
            .parse()
            .map_err(|_| malformed(line_number, "invalid timestamp"))?;

        rows.push((user, item, rating, timestamp));
    }

    Ok(densify(rows))
}

/// Read a single-byte-delimited ratings file of `user item rating` rows
/// (Epinions and FilmTrust style), remapping raw ids to dense indices.
///
/// The files carry no timestamps; all interactions get timestamp 0.
pub fn read_plain_ratings<P: AsRef<Path>>(
    path: P,
    delimiter: u8,
) -> Result<RatingsDataset, failure::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_path(path)?;

    let mut rows = Vec::new();

    for record in reader.deserialize() {
        let (user, item, rating): (u32, u32, f32) = record?;
        rows.push((user, item, rating, 0));
    }

    Ok(densify(rows))
}

/// Movie-side metadata from a MovieLens `movies.dat` row.
#[derive(Clone, Debug)]
pub struct MovieMetadata {
    /// Raw movie id, as it appears in the ratings file.
    pub movie_id: u32,
    /// The first of the movie's genre tags.
    pub genre: String,
    /// Release year, parsed from the trailing "(YYYY)" of the title.
    pub year: Option<i32>,
}

/// Read a MovieLens `movies.dat` file of `movieId::title::genres` rows.
pub fn read_movie_metadata<P: AsRef<Path>>(path: P) -> Result<Vec<MovieMetadata>, failure::Error> {
    let bytes = fs::read(path)?;
    let contents = String::from_utf8_lossy(&bytes);

    let mut movies = Vec::new();

    for (idx, line) in contents.lines().enumerate() {
        if line.is_empty() {
            continue;
        }

        let line_number = idx + 1;
        let fields = split_double_colon(line, line_number, 3)?;

        let movie_id: u32 = fields[0]
            .parse()
            .map_err(|_| malformed(line_number, "invalid movie id"))?;

        let title = fields[1];
        let year = title
            .rfind('(')
            .map(|start| &title[start + 1..])
            .and_then(|tail| tail.trim_end().trim_end_matches(')').parse().ok());

        let genre = fields[2]
            .split('|')
            .next()
            .unwrap_or("")
            .to_owned();

        movies.push(MovieMetadata {
            movie_id,
            genre,
            year,
        });
    }

    Ok(movies)
}

/// User-side metadata from a MovieLens `users.dat` row. The zipcode
/// column is dropped.
#[derive(Clone, Debug)]
pub struct UserMetadata {
    /// Raw user id, as it appears in the ratings file.
    pub user_id: u32,
    /// Gender marker.
    pub gender: String,
    /// Age bucket.
    pub age: u32,
    /// Occupation code.
    pub occupation: u32,
}

/// Read a MovieLens `users.dat` file of
/// `userId::gender::age::occupation::zipcode` rows.
pub fn read_user_metadata<P: AsRef<Path>>(path: P) -> Result<Vec<UserMetadata>, failure::Error> {
    let bytes = fs::read(path)?;
    let contents = String::from_utf8_lossy(&bytes);

    let mut users = Vec::new();

    for (idx, line) in contents.lines().enumerate() {
        if line.is_empty() {
            continue;
        }

        let line_number = idx + 1;
        let fields = split_double_colon(line, line_number, 5)?;

        let user_id: u32 = fields[0]
            .parse()
            .map_err(|_| malformed(line_number, "invalid user id"))?;
        let age: u32 = fields[2]
            .parse()
            .map_err(|_| malformed(line_number, "invalid age"))?;
        let occupation: u32 = fields[3]
            .parse()
            .map_err(|_| malformed(line_number, "invalid occupation"))?;

        users.push(UserMetadata {
            user_id,
            gender: fields[1].to_owned(),
            age,
            occupation,
        });
    }

    Ok(users)
}

/// Read a single-byte-delimited trust file of `source target weight` rows.
///
/// The ids are left raw: alignment with a ratings index space happens in
/// `trust::trust_matrix`.
pub fn read_trust_statements<P: AsRef<Path>>(
    path: P,
    delimiter: u8,
) -> Result<Vec<TrustStatement>, failure::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_path(path)?;

    let statements: Vec<TrustStatement> = reader.deserialize().collect::<Result<Vec<_>, _>>()?;

    Ok(statements)
}

#[cfg(feature = "download")]
mod download {
    use std::env;
    use std::fs::{create_dir_all, rename, File};
    use std::io::BufWriter;
    use std::path::{Path, PathBuf};

    use csv;
    use failure;
    use reqwest;

    use super::{densify, DatasetError, RatingsDataset};
    use Timestamp;

    fn create_data_dir() -> Result<PathBuf, failure::Error> {
        let path = env::home_dir()
            .ok_or_else(|| DatasetError::NoHomeDir)?
            .join(".recprep");

        if !path.exists() {
            create_dir_all(&path)?;
        }

        Ok(path)
    }

    fn download(url: &str, dest_filename: &Path) -> Result<RatingsDataset, failure::Error> {
        let data_dir = create_data_dir()?;
        let desired_filename = data_dir.join(dest_filename);
        let temp_filename = env::temp_dir().join(dest_filename);

        if !desired_filename.exists() {
            let file = File::create(&temp_filename)?;
            let mut writer = BufWriter::new(file);

            let mut response = reqwest::blocking::get(url)?;
            response.copy_to(&mut writer)?;

            rename(temp_filename, &desired_filename)?;
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_path(desired_filename)?;

        let mut rows: Vec<(u32, u32, f32, Timestamp)> = Vec::new();

        for record in reader.deserialize() {
            rows.push(record?);
        }

        Ok(densify(rows))
    }

    /// Download the Movielens 100K ratings and return them.
    ///
    /// The data is stored in `~/.recprep/`.
    pub fn download_movielens_100k() -> Result<RatingsDataset, failure::Error> {
        download(
            "http://files.grouplens.org/datasets/movielens/ml-100k/u.data",
            Path::new("movielens_100k.data"),
        )
    }
}

#[cfg(feature = "download")]
pub use self::download::download_movielens_100k;
