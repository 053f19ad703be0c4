use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use anyhow::anyhow;
use futures_util::future::{FutureExt, LocalBoxFuture};
use url::Url;

use crate::loader::event::Event;

pub type HandlerFuture = LocalBoxFuture<'static, anyhow::Result<()>>;

/// Executable behavior behind a handler reference. Invoked with the event and
/// the element the reference was found on.
pub type Handler<N> = Rc<dyn Fn(Rc<Event<N>>, N) -> HandlerFuture>;

/// Wrap an async closure as a [`Handler`].
pub fn handler<N, F, Fut>(f: F) -> Handler<N>
where
    N: 'static,
    F: Fn(Rc<Event<N>>, N) -> Fut + 'static,
    Fut: Future<Output = anyhow::Result<()>> + 'static,
{
    Rc::new(move |event, element| f(event, element).boxed_local())
}

/// Wrap a synchronous closure as a [`Handler`].
pub fn sync_handler<N, F>(f: F) -> Handler<N>
where
    N: 'static,
    F: Fn(Rc<Event<N>>, N) -> anyhow::Result<()> + 'static,
{
    Rc::new(move |event, element| {
        let result = f(event, element);
        async move { result }.boxed_local()
    })
}

/// Symbol table of one loaded unit of code.
pub struct Module<N> {
    exports: HashMap<String, Handler<N>>,
}

impl<N> Clone for Module<N> {
    fn clone(&self) -> Self {
        Self {
            exports: self.exports.clone(),
        }
    }
}

impl<N> Default for Module<N> {
    fn default() -> Self {
        Self {
            exports: HashMap::new(),
        }
    }
}

impl<N> fmt::Debug for Module<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.exports.keys().collect();
        names.sort();
        f.debug_struct("Module").field("exports", &names).finish()
    }
}

impl<N> Module<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn export(mut self, name: impl Into<String>, handler: Handler<N>) -> Self {
        self.exports.insert(name.into(), handler);
        self
    }

    pub fn get(&self, name: &str) -> Option<Handler<N>> {
        self.exports.get(name).cloned()
    }
}

/// Loads external units of code by URL. Failures surface as `Err`.
pub trait ModuleLoader<N> {
    fn import(&self, url: &Url) -> LocalBoxFuture<'static, anyhow::Result<Module<N>>>;
}

enum Entry<N> {
    Loaded(Module<N>),
    Failing(String),
}

/// In-memory [`ModuleLoader`] keyed by module URL.
///
/// Imports complete on a later poll so callers observe a real suspension
/// point, like a network-backed `import()`.
pub struct ModuleRegistry<N> {
    modules: RefCell<HashMap<Url, Entry<N>>>,
    imports: Cell<usize>,
}

impl<N> Default for ModuleRegistry<N> {
    fn default() -> Self {
        Self {
            modules: RefCell::new(HashMap::new()),
            imports: Cell::new(0),
        }
    }
}

impl<N> ModuleRegistry<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: Url, module: Module<N>) {
        self.modules
            .borrow_mut()
            .insert(module_key(url), Entry::Loaded(module));
    }

    /// Make every import of `url` fail with `message`.
    pub fn insert_failure(&self, url: Url, message: impl Into<String>) {
        self.modules
            .borrow_mut()
            .insert(module_key(url), Entry::Failing(message.into()));
    }

    /// Number of `import` calls served so far.
    pub fn import_count(&self) -> usize {
        self.imports.get()
    }

    pub fn len(&self) -> usize {
        self.modules.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.borrow().is_empty()
    }
}

impl<N: 'static> ModuleLoader<N> for ModuleRegistry<N> {
    fn import(&self, url: &Url) -> LocalBoxFuture<'static, anyhow::Result<Module<N>>> {
        self.imports.set(self.imports.get() + 1);
        let key = module_key(url.clone());
        let result = match self.modules.borrow().get(&key) {
            Some(Entry::Loaded(module)) => Ok(module.clone()),
            Some(Entry::Failing(message)) => Err(anyhow!("{message}")),
            None => Err(anyhow!("module not found: {key}")),
        };
        async move {
            tokio::task::yield_now().await;
            result
        }
        .boxed_local()
    }
}

fn module_key(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}
