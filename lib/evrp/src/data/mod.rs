use anyhow::Result;
use instances::dataset::{evrp as dset, Dataset, IdxNameMap};

pub mod evrp;

pub fn get_evrp_instance_by_name(name : &str) -> Result<evrp::EvrpInstance> {
  get_evrp_instance_by_index(dset::DSET.name_to_index(name)?)
}


pub fn get_evrp_instance_by_index(idx : usize) -> Result<evrp::EvrpInstance> {
    dset::DSET.load_instance(idx)
}
