/// BindingPool - one exactly-sized device pool per pipeline
///
/// The pool is sized from the pipeline's reflected bindings before any table
/// is allocated: one table per declared set and, per binding kind, the sum of
/// descriptor counts over every reflected binding of that kind. Tables are
/// allocated lazily, at most once per set index.

use std::sync::Arc;

use crate::device::{
    BindingDevice, BindingHistogram, BindingPoolDesc, PipelineReflection,
    PoolHandle, SetLayoutHandle, TableHandle,
};
use crate::error::{Error, Result};
use crate::{binder_error, binder_trace};

const SOURCE: &str = "binder::BindingPool";

pub struct BindingPool {
    device: Arc<dyn BindingDevice>,
    /// None when no set is declared, or after `destroy`
    handle: Option<PoolHandle>,
    set_layouts: Vec<SetLayoutHandle>,
    /// One slot per declared set index
    tables: Vec<Option<TableHandle>>,
    histogram: BindingHistogram,
}

impl BindingPool {
    /// Size and create the device pool for a pipeline
    ///
    /// # Arguments
    ///
    /// * `device` - Device the pool and its tables are created on
    /// * `reflection` - Reflected bindings of every stage of the pipeline
    /// * `set_layouts` - One table shape per declared set index
    ///
    /// # Errors
    ///
    /// Propagates the device error if the pool cannot be created.
    pub fn new(
        device: Arc<dyn BindingDevice>,
        reflection: &PipelineReflection,
        set_layouts: &[SetLayoutHandle],
    ) -> Result<Self> {
        let histogram = BindingHistogram::from_reflection(reflection);
        let declared = set_layouts.len();

        let handle = if declared == 0 {
            None
        } else {
            let desc = BindingPoolDesc {
                max_tables: declared as u32,
                sizes: histogram.pool_sizes(),
            };
            let handle = device.create_binding_pool(&desc)?;
            binder_trace!(
                SOURCE,
                "Created pool {:?}: {} tables, {} descriptors over {} kinds",
                handle, declared, histogram.total(), histogram.len()
            );
            Some(handle)
        };

        Ok(Self {
            device,
            handle,
            set_layouts: set_layouts.to_vec(),
            tables: vec![None; declared],
            histogram,
        })
    }

    /// Table for `set`, allocating it on first use
    ///
    /// # Errors
    ///
    /// * `Error::InvalidSetIndex` - `set` is not a declared set index
    /// * `Error::PoolExhausted` - the device refused the allocation
    /// * `Error::InvalidResource` - the pool was already destroyed
    pub fn get_or_create(&mut self, set: u32) -> Result<TableHandle> {
        let index = set as usize;
        if index >= self.tables.len() {
            return Err(Error::InvalidSetIndex {
                set,
                declared: self.declared_set_count(),
            });
        }
        if let Some(table) = self.tables[index] {
            return Ok(table);
        }

        let pool = self
            .handle
            .ok_or_else(|| Error::InvalidResource("binding pool already destroyed".to_string()))?;

        // The pool holds exactly what the histogram asked for, so running out
        // here means the sizing invariant was broken
        let table = self
            .device
            .allocate_binding_table(pool, self.set_layouts[index])
            .map_err(|e| {
                binder_error!(
                    SOURCE,
                    "Table allocation for set {} failed on an exactly-sized pool: {}",
                    set, e
                );
                Error::PoolExhausted { set }
            })?;

        self.tables[index] = Some(table);
        binder_trace!(SOURCE, "Allocated table {:?} for set {}", table, set);
        Ok(table)
    }

    /// Table already allocated for `set`, if any
    pub fn table(&self, set: u32) -> Option<TableHandle> {
        self.tables.get(set as usize).copied().flatten()
    }

    /// Allocated tables in ascending set order
    pub fn allocated_tables(&self) -> impl Iterator<Item = (u32, TableHandle)> + '_ {
        self.tables
            .iter()
            .enumerate()
            .filter_map(|(set, table)| table.map(|t| (set as u32, t)))
    }

    pub fn allocated_count(&self) -> usize {
        self.tables.iter().filter(|t| t.is_some()).count()
    }

    pub fn declared_set_count(&self) -> u32 {
        self.tables.len() as u32
    }

    /// Descriptor counts the pool was sized with
    pub fn histogram(&self) -> &BindingHistogram {
        &self.histogram
    }

    /// Device pool handle (None if no set is declared or after destroy)
    pub fn handle(&self) -> Option<PoolHandle> {
        self.handle
    }

    /// Release the device pool and every table allocated from it
    ///
    /// Idempotent. Issued table handles are invalid afterwards.
    pub fn destroy(&mut self) {
        if let Some(pool) = self.handle.take() {
            self.device.destroy_binding_pool(pool);
            self.tables.iter_mut().for_each(|t| *t = None);
            binder_trace!(SOURCE, "Destroyed pool {:?}", pool);
        }
    }
}

impl Drop for BindingPool {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
#[path = "binding_pool_tests.rs"]
mod tests;
