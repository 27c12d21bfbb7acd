//! Assembly of weak forms into linear systems.
//!
//! Local element contributions are computed independently for each element and collected as
//! triplets in a [`ScatterBuffer`]. The parallel assembler builds one buffer per rayon task and
//! merges them in a reduction, so no synchronization on the global matrix is needed. The final
//! conversion from COO to CSR format sums duplicate entries.
use crate::error::Error;
use crate::nalgebra::{DVector, DVectorView};
use crate::space::FunctionSpace;
use crate::weak_form::WeakForm;
use ellipt2d_sparse::{CooMatrix, CsrMatrix};
use log::debug;
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use std::cell::RefCell;
use thread_local::ThreadLocal;

pub mod local;

use local::ElementWorkspace;

/// A sparse linear system `A x = b` over the free degrees of freedom of a function space.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSystem {
    matrix: CsrMatrix<f64>,
    rhs: DVector<f64>,
    symmetric: bool,
}

impl LinearSystem {
    /// # Panics
    ///
    /// Panics if the matrix is not square or its dimension does not match the right-hand side.
    pub fn new(matrix: CsrMatrix<f64>, rhs: DVector<f64>) -> Self {
        assert_eq!(matrix.nrows(), matrix.ncols(), "Matrix must be square");
        assert_eq!(
            matrix.nrows(),
            rhs.len(),
            "Matrix dimension must match right-hand side length"
        );
        Self {
            matrix,
            rhs,
            symmetric: false,
        }
    }

    /// Declares whether the matrix is known to be symmetric.
    ///
    /// The hint is not checked.
    pub fn with_symmetry_hint(mut self, symmetric: bool) -> Self {
        self.symmetric = symmetric;
        self
    }

    pub fn matrix(&self) -> &CsrMatrix<f64> {
        &self.matrix
    }

    pub fn rhs(&self) -> &DVector<f64> {
        &self.rhs
    }

    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    pub fn dimension(&self) -> usize {
        self.rhs.len()
    }

    /// Iterates over the stored matrix entries as `(row, col, value)` triplets.
    pub fn triplets(&self) -> impl '_ + Iterator<Item = (usize, usize, f64)> {
        self.matrix
            .triplet_iter()
            .map(|(i, j, v)| (i, j, *v))
    }

    /// Computes `|| A x - b ||`.
    ///
    /// # Panics
    ///
    /// Panics if `x` does not have the dimension of the system.
    pub fn residual_norm<'a>(&self, x: impl Into<DVectorView<'a, f64>>) -> f64 {
        let x = x.into();
        assert_eq!(x.len(), self.dimension());
        let mut residual = -self.rhs.clone();
        for (i, j, v) in self.matrix.triplet_iter() {
            residual[i] += v * x[j];
        }
        residual.norm()
    }

    pub fn into_parts(self) -> (CsrMatrix<f64>, DVector<f64>) {
        (self.matrix, self.rhs)
    }
}

/// Global matrix and right-hand side entries collected from element contributions.
#[derive(Debug, Clone, Default)]
pub struct ScatterBuffer {
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<f64>,
    rhs: Vec<(usize, f64)>,
}

impl ScatterBuffer {
    pub fn push_matrix_entry(&mut self, row: usize, col: usize, value: f64) {
        self.rows.push(row);
        self.cols.push(col);
        self.values.push(value);
    }

    pub fn push_rhs_entry(&mut self, row: usize, value: f64) {
        self.rhs.push((row, value));
    }

    pub fn num_matrix_entries(&self) -> usize {
        self.values.len()
    }

    pub fn merge(&mut self, mut other: ScatterBuffer) {
        self.rows.append(&mut other.rows);
        self.cols.append(&mut other.cols);
        self.values.append(&mut other.values);
        self.rhs.append(&mut other.rhs);
    }

    /// Sums all collected entries into a linear system of the given dimension.
    pub fn into_linear_system(self, dimension: usize) -> LinearSystem {
        let mut coo = CooMatrix::new(dimension, dimension);
        for ((&i, &j), &v) in self.rows.iter().zip(&self.cols).zip(&self.values) {
            coo.push(i, j, v);
        }
        let mut rhs = DVector::zeros(dimension);
        for (i, v) in self.rhs {
            rhs[i] += v;
        }
        LinearSystem::new(CsrMatrix::from(&coo), rhs)
    }
}

/// Assembles the linear system of a weak form on a function space.
///
/// The assembler keeps its element workspaces, so that repeated assembly reuses tabulated
/// basis functions.
pub struct Assembler<'a> {
    space: &'a FunctionSpace,
    weak_form: &'a WeakForm,
    parallel: bool,
    workspace: RefCell<ElementWorkspace>,
    par_workspace: ThreadLocal<RefCell<ElementWorkspace>>,
}

impl<'a> Assembler<'a> {
    pub fn new(space: &'a FunctionSpace, weak_form: &'a WeakForm) -> Self {
        Self {
            space,
            weak_form,
            parallel: false,
            workspace: RefCell::new(ElementWorkspace::default()),
            par_workspace: ThreadLocal::new(),
        }
    }

    /// Whether element contributions are computed in parallel with rayon.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn assemble(&self) -> Result<LinearSystem, Error> {
        let buffer = if self.parallel {
            self.assemble_par()?
        } else {
            self.assemble_serial()?
        };

        debug!(
            "Assembled {} matrix triplets for {} free degrees of freedom{}",
            buffer.num_matrix_entries(),
            self.space.num_free_dofs(),
            if self.parallel { " (parallel)" } else { "" }
        );

        let system = buffer
            .into_linear_system(self.space.num_free_dofs())
            .with_symmetry_hint(self.weak_form.is_symmetric());
        Ok(system)
    }

    fn assemble_serial(&self) -> Result<ScatterBuffer, Error> {
        let ws = &mut *self.workspace.borrow_mut();
        let mut buffer = ScatterBuffer::default();
        for element_idx in 0..self.space.mesh().num_elements() {
            ws.assemble_element(self.space, self.weak_form, element_idx, &mut buffer)?;
        }
        Ok(buffer)
    }

    fn assemble_par(&self) -> Result<ScatterBuffer, Error> {
        let space = self.space;
        let weak_form = self.weak_form;
        let workspaces = &self.par_workspace;
        (0..space.mesh().num_elements())
            .into_par_iter()
            .with_min_len(50)
            .try_fold(ScatterBuffer::default, |mut buffer, element_idx| {
                let ws = &mut *workspaces.get_or_default().borrow_mut();
                ws.assemble_element(space, weak_form, element_idx, &mut buffer)?;
                Ok::<_, Error>(buffer)
            })
            .try_reduce(ScatterBuffer::default, |mut a, b| {
                a.merge(b);
                Ok(a)
            })
    }
}
