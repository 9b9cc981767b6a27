use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

/// Department a person is primarily known for, used to split actors from directors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Department {
    Acting,
    Directing,
}

impl Department {
    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Acting => "Acting",
            Department::Directing => "Directing",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Person {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub profile_path: Option<String>,
    #[serde(default)]
    pub known_for_department: Option<String>,
}

impl Person {
    pub fn works_in(&self, department: Department) -> bool {
        self.known_for_department.as_deref() == Some(department.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogMovie {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
}

/// Build a full image URL from a catalog-relative path
pub fn image_url(path: &str, width: u32) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!("https://image.tmdb.org/t/p/w{}{}", width, path)
    }
}
