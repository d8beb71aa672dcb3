use std::collections::HashMap;

/// Token ↔ id mapping built from whitespace-tokenized documents.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    token2id: HashMap<String, usize>,
    terms: Vec<String>,
    /// Corpus-wide count per id
    frequencies: Vec<usize>,
}

/// Sparse document: `(term id, count)` pairs sorted by id.
pub type BagOfWords = Vec<(usize, usize)>;

impl Dictionary {
    pub fn from_documents<S: AsRef<str>>(documents: &[Vec<S>]) -> Self {
        let mut dictionary = Self::default();
        for document in documents {
            for token in document {
                let id = dictionary.intern(token.as_ref());
                dictionary.frequencies[id] += 1;
            }
        }
        dictionary
    }

    fn intern(&mut self, token: &str) -> usize {
        if let Some(id) = self.token2id.get(token) {
            return *id;
        }
        let id = self.terms.len();
        self.token2id.insert(token.to_string(), id);
        self.terms.push(token.to_string());
        self.frequencies.push(0);
        id
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn id(&self, token: &str) -> Option<usize> {
        self.token2id.get(token).copied()
    }

    pub fn term(&self, id: usize) -> &str {
        &self.terms[id]
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn frequencies(&self) -> &[usize] {
        &self.frequencies
    }

    /// Unknown tokens are dropped.
    pub fn doc2bow<S: AsRef<str>>(&self, document: &[S]) -> BagOfWords {
        let mut counts: HashMap<usize, usize> = HashMap::new();
        for id in document.iter().filter_map(|t| self.id(t.as_ref())) {
            *counts.entry(id).or_insert(0) += 1;
        }
        let mut bow: BagOfWords = counts.into_iter().collect();
        bow.sort_unstable();
        bow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dictionary() {
        let docs = vec![
            vec!["court", "ruling", "court"],
            vec!["minister", "court"],
        ];
        let dictionary = Dictionary::from_documents(&docs);

        assert_eq!(dictionary.len(), 3);
        assert_eq!(dictionary.id("court"), Some(0));
        assert_eq!(dictionary.frequencies()[0], 3);
        assert_eq!(dictionary.doc2bow(&docs[0]), vec![(0, 2), (1, 1)]);
        assert_eq!(dictionary.doc2bow(&["unknown", "minister"]), vec![(2, 1)]);
    }
}
