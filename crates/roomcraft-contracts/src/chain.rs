/// Ordered set of interchangeable backends; iteration order is fallback order.
#[derive(Debug, Clone)]
pub struct BackendChain<T: NamedBackend> {
    backends: Vec<T>,
}

pub trait NamedBackend {
    fn name(&self) -> &str;
}

impl<T: NamedBackend> Default for BackendChain<T> {
    fn default() -> Self {
        Self {
            backends: Vec::new(),
        }
    }
}

impl<T: NamedBackend> BackendChain<T> {
    pub fn new(backends: Vec<T>) -> Self {
        Self { backends }
    }

    pub fn push(&mut self, backend: T) {
        self.backends.push(backend);
    }

    /// Names in fallback order.
    pub fn names(&self) -> Vec<String> {
        self.backends
            .iter()
            .map(|backend| backend.name().to_string())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.backends.iter()
    }
}

impl<T: NamedBackend + ?Sized> NamedBackend for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::{BackendChain, NamedBackend};

    #[derive(Clone, Debug)]
    struct Dummy {
        name: String,
    }

    impl NamedBackend for Dummy {
        fn name(&self) -> &str {
            self.name.as_str()
        }
    }

    fn dummy(name: &str) -> Dummy {
        Dummy {
            name: name.to_string(),
        }
    }

    #[test]
    fn preserves_insertion_order() {
        let mut chain = BackendChain::new(vec![dummy("gemini-image"), dummy("imagen")]);
        chain.push(dummy("aardvark"));
        assert_eq!(chain.names(), vec!["gemini-image", "imagen", "aardvark"]);
    }

    #[test]
    fn boxed_trait_objects_keep_their_names() {
        let chain: BackendChain<Box<dyn NamedBackend>> =
            BackendChain::new(vec![Box::new(dummy("imagen"))]);
        assert_eq!(chain.names(), vec!["imagen"]);
        assert!(!chain.is_empty());
    }

    #[test]
    fn empty_chain_reports_empty() {
        let chain: BackendChain<Dummy> = BackendChain::default();
        assert!(chain.is_empty());
        assert!(chain.names().is_empty());
    }
}
