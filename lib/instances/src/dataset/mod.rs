use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use crate::Error;
use fnv::FnvHashSet;
use std::borrow::Cow;


pub trait IdxNameMap {
  fn index_to_name(&self, idx: usize) -> Result<Cow<str>>;

  fn name_to_index(&self, name: &str) -> Result<usize>;

  fn len(&self) -> usize;

  fn check_idx(&self, idx: usize) -> Result<()> {
    if self.len() <= idx {
      Err(Error::IndexOutOfRange.into())
    } else {
      Ok(())
    }
  }
}


impl<'a, D: IdxNameMap> IdxNameMap for &'a D {
  fn index_to_name(&self, idx: usize) -> Result<Cow<str>> {
    D::index_to_name(self, idx)
  }

  fn name_to_index(&self, name: &str) -> Result<usize> {
    D::name_to_index(self, name)
  }

  fn len(&self) -> usize {
    D::len(self)
  }
}

pub trait Dataset: IdxNameMap + Sync {
  type Instance;
  fn load_instance(&self, idx: usize) -> Result<Self::Instance>;
}


impl<'a, D: Dataset> Dataset for &'a D {
  type Instance = D::Instance;

  fn load_instance(&self, idx: usize) -> Result<Self::Instance> {
    D::load_instance(self, idx)
  }
}

/// Root directory of the instance files: the `DATA_ROOT` environment
/// variable if set, otherwise the `data/` directory at the workspace root.
fn data_root() -> PathBuf {
  match std::env::var_os("DATA_ROOT") {
    Some(p) => PathBuf::from(p),
    None => Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..").join("data"),
  }
}


/// A Standard Layout Dataset: a directory containing instance files and `INDEX.txt` index file.
/// The index file contains a new-line separated list of instance names, which acts as a map from index -> name.
/// Each instance file is named `NAME.SUFFIX`.
pub struct StdLayout<D> {
  _marker: PhantomData<D>,
  name_order: Vec<String>,
  name_to_idx_map: HashMap<String, usize>,
  dir: PathBuf,
  suffix: String,
}


impl<D> StdLayout<D> {
  fn new(dir: impl AsRef<Path>, suffix: &str) -> Result<StdLayout<D>> {
    let dir = data_root().join(dir);
    let ctx = format!("try read directory {:?}", &dir);
    let dir = dir.canonicalize().context(ctx)?;

    let contents = std::fs::read_to_string(dir.join("INDEX.txt"))?;
    let name_order: Vec<String> = contents.split_whitespace().map(|s| s.trim().to_string()).collect();
    let name_to_idx_map: HashMap<_, _> = name_order.iter().enumerate().map(|(i, s)| (s.clone(), i)).collect();

    Ok(StdLayout {
      _marker: PhantomData {},
      name_order,
      name_to_idx_map,
      dir,
      suffix: suffix.to_string(),
    })
  }

  pub fn instance_path(&self, idx: usize) -> Result<PathBuf> {
    let name = self.index_to_name(idx)?;
    let mut path = self.dir.join(&*name);
    path.set_extension(&self.suffix);
    Ok(path)
  }
}

impl<D> IdxNameMap for StdLayout<D> {
  fn index_to_name(&self, idx: usize) -> Result<Cow<str>> {
    self.check_idx(idx)?;
    Ok(Cow::Borrowed(&self.name_order[idx]))
  }

  fn name_to_index(&self, name: &str) -> Result<usize> {
    self.name_to_idx_map.get(name).ok_or(Error::UnknownInstanceName.into()).map(|i| *i)
  }

  fn len(&self) -> usize { self.name_order.len() }
}


pub struct Subset<D> {
  dataset: D,
  indices: Vec<usize>,
  index_set: FnvHashSet<usize>,
}

impl<D: IdxNameMap> Subset<D> {
  pub fn new(dataset: D, indices: Vec<usize>) -> Self {
    for &i in &indices {
      if i >= dataset.len() {
        panic!("index {} out of range (0..{})", i, dataset.len())
      }
    }
    let index_set: FnvHashSet<_> = indices.iter().cloned().collect();
    if index_set.len() != indices.len() {
      panic!("indices must be unique")
    }
    Subset { dataset, indices, index_set }
  }

  fn map_index(&self, idx: usize) -> Result<usize> {
    self.indices.get(idx).copied().ok_or_else(|| Error::IndexOutOfRange.into())
  }
}

impl<D: IdxNameMap> IdxNameMap for Subset<D> {
  fn name_to_index(&self, name: &str) -> Result<usize> {
    let idx = self.dataset.name_to_index(name)?;
    if self.index_set.contains(&idx) {
      Ok(idx)
    } else {
      Err(Error::UnknownInstanceName.into())
    }
  }

  fn index_to_name(&self, idx: usize) -> Result<Cow<str>> {
    self.dataset.index_to_name(self.map_index(idx)?)
  }

  fn len(&self) -> usize { self.indices.len() }
}

impl<I, D: Dataset<Instance=I>> Dataset for Subset<D> {
  type Instance = I;
  fn load_instance(&self, idx: usize) -> Result<I> {
    self.dataset.load_instance(self.map_index(idx)?)
  }
}


pub mod evrp;


fn pretty_unwrap<T>(r: Result<T>) -> T {
  match r {
    Err(e) => panic!("{:?}", e),
    Ok(t) => t
  }
}
