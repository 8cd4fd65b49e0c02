//! WebGPU implementation of the propagation contract.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use glam::DVec3;
use parking_lot::Mutex;
use wgpu::util::DeviceExt;

use phasefield_core::descriptor::DESCRIPTOR_WIDTH;
use phasefield_core::error::{FieldError, Result};
use phasefield_core::propagator::{
    report_performance, validate_array, validate_points, validate_wavenumber, FieldSamples,
    HexagonalLattice, PropagationOptions, Propagator, RectilinearLattice, RECORD_WIDTH,
};
use phasefield_core::TxArray;

use crate::context::ComputeContext;
use crate::shader::{propagation_shader, GpuGeometry, Kernel};

const BACKEND: &str = "wgpu";

/// Largest workgroup count along one dispatch dimension.
const MAX_GROUPS_PER_DIMENSION: u32 = 65_535;

/// Compiled pipelines for one workgroup size.
struct KernelSet {
    rectilinear: wgpu::ComputePipeline,
    hexagonal: wgpu::ComputePipeline,
    points: wgpu::ComputePipeline,
    single_focus: wgpu::ComputePipeline,
}

impl KernelSet {
    fn pipeline(&self, kernel: Kernel) -> &wgpu::ComputePipeline {
        match kernel {
            Kernel::Rectilinear => &self.rectilinear,
            Kernel::Hexagonal => &self.hexagonal,
            Kernel::Points => &self.points,
            Kernel::SingleFocus => &self.single_focus,
        }
    }
}

/// Buffers and sizes for one dispatch.
struct Dispatch<'a> {
    kernel: Kernel,
    geometry: GpuGeometry,
    table: &'a [f32],
    points: Option<&'a [[f32; 4]]>,
    /// Initial output contents; zeroed when `None`.
    output_seed: Option<&'a [f32]>,
    output_len: usize,
    invocations: u32,
}

/// Propagator running WGSL kernels on a [`ComputeContext`].
///
/// Holds one compute pipeline per kernel family. Pipelines are compiled per
/// workgroup size on first use and cached for the lifetime of the propagator.
pub struct WgpuPropagator {
    context: Arc<ComputeContext>,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    kernels: Mutex<HashMap<u32, Arc<KernelSet>>>,
}

impl WgpuPropagator {
    /// Create a propagator and compile the kernels for the default workgroup size.
    pub fn new(context: Arc<ComputeContext>) -> Result<Self> {
        let device = context.device();

        let storage = |binding: u32, read_only: bool| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Propagation Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                storage(1, true),
                storage(2, true),
                storage(3, false),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Propagation Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let propagator = Self {
            context,
            bind_group_layout,
            pipeline_layout,
            kernels: Mutex::new(HashMap::new()),
        };
        propagator.kernels_for(PropagationOptions::default().workgroup_size)?;

        tracing::info!(
            "WebGPU propagator ready on {} ({:?})",
            propagator.context.name(),
            propagator.context.backend()
        );
        Ok(propagator)
    }

    /// The device context.
    pub fn context(&self) -> &Arc<ComputeContext> {
        &self.context
    }

    fn kernels_for(&self, workgroup_size: u32) -> Result<Arc<KernelSet>> {
        let limits = self.context.limits();
        if workgroup_size == 0
            || workgroup_size > limits.max_compute_workgroup_size_x
            || workgroup_size > limits.max_compute_invocations_per_workgroup
        {
            return Err(FieldError::compute(format!(
                "workgroup size {} is outside the device limit of {}",
                workgroup_size,
                limits
                    .max_compute_workgroup_size_x
                    .min(limits.max_compute_invocations_per_workgroup)
            )));
        }

        let mut cache = self.kernels.lock();
        if let Some(set) = cache.get(&workgroup_size) {
            return Ok(Arc::clone(set));
        }

        let set = Arc::new(self.compile(workgroup_size)?);
        cache.insert(workgroup_size, Arc::clone(&set));
        Ok(set)
    }

    fn compile(&self, workgroup_size: u32) -> Result<KernelSet> {
        tracing::debug!("Compiling propagation kernels (workgroup size {})", workgroup_size);
        let device = self.context.device();

        self.scoped("kernel compilation", || {
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Propagation Shader"),
                source: wgpu::ShaderSource::Wgsl(propagation_shader(workgroup_size).into()),
            });

            let pipeline = |kernel: Kernel| {
                device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some(kernel.entry_point()),
                    layout: Some(&self.pipeline_layout),
                    module: &module,
                    entry_point: kernel.entry_point(),
                })
            };

            KernelSet {
                rectilinear: pipeline(Kernel::Rectilinear),
                hexagonal: pipeline(Kernel::Hexagonal),
                points: pipeline(Kernel::Points),
                single_focus: pipeline(Kernel::SingleFocus),
            }
        })
    }

    /// Run `f` inside validation and out-of-memory error scopes.
    fn scoped<T>(&self, what: &str, f: impl FnOnce() -> T) -> Result<T> {
        let device = self.context.device();
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let value = f();

        let validation = futures::executor::block_on(device.pop_error_scope());
        let out_of_memory = futures::executor::block_on(device.pop_error_scope());
        match validation.or(out_of_memory) {
            Some(error) => Err(FieldError::compute(format!("{} failed: {}", what, error))),
            None => Ok(value),
        }
    }

    fn check_binding_size(&self, what: &str, bytes: u64) -> Result<()> {
        let limit = self.context.limits().max_storage_buffer_binding_size as u64;
        if bytes > limit {
            return Err(FieldError::compute(format!(
                "{} needs {} bytes, device binding limit is {}",
                what, bytes, limit
            )));
        }
        Ok(())
    }

    /// Upload inputs, run one kernel and read the output buffer back.
    fn run(&self, dispatch: Dispatch<'_>, options: &PropagationOptions) -> Result<Vec<f32>> {
        let workgroup_size = options.workgroup_size;
        let kernels = self.kernels_for(workgroup_size)?;

        let output_bytes = (dispatch.output_len * std::mem::size_of::<f32>()) as u64;
        self.check_binding_size("output buffer", output_bytes)?;
        self.check_binding_size(
            "element table",
            std::mem::size_of_val(dispatch.table) as u64,
        )?;

        let groups = dispatch.invocations.div_ceil(workgroup_size);
        let groups_x = groups.min(MAX_GROUPS_PER_DIMENSION);
        let groups_y = groups.div_ceil(groups_x);
        if groups_y > MAX_GROUPS_PER_DIMENSION {
            return Err(FieldError::compute(format!(
                "{} invocations exceed the dispatch limit",
                dispatch.invocations
            )));
        }
        tracing::debug!(
            "{}: {} invocations in {}x{} workgroups of {}",
            dispatch.kernel.entry_point(),
            dispatch.invocations,
            groups_x,
            groups_y,
            workgroup_size
        );

        let device = self.context.device();
        let queue = self.context.queue();

        let staging = self.scoped(dispatch.kernel.entry_point(), || {
            let geometry_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Geometry"),
                contents: bytemuck::bytes_of(&dispatch.geometry),
                usage: wgpu::BufferUsages::UNIFORM,
            });

            let element_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Element Table"),
                contents: bytemuck::cast_slice(dispatch.table),
                usage: wgpu::BufferUsages::STORAGE,
            });

            // Lattice kernels never read binding 2; bind a placeholder
            let placeholder = [[0.0f32; 4]];
            let point_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Points"),
                contents: bytemuck::cast_slice(dispatch.points.unwrap_or(&placeholder)),
                usage: wgpu::BufferUsages::STORAGE,
            });

            let output_usage = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC;
            let output_buffer = match dispatch.output_seed {
                Some(seed) => device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Output"),
                    contents: bytemuck::cast_slice(seed),
                    usage: output_usage,
                }),
                None => device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("Output"),
                    size: output_bytes,
                    usage: output_usage,
                    mapped_at_creation: false,
                }),
            };

            let staging = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Output Staging"),
                size: output_bytes,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Propagation Bind Group"),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: geometry_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: element_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: point_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: output_buffer.as_entire_binding(),
                    },
                ],
            });

            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Propagation Encoder"),
            });

            {
                let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some("Propagation Pass"),
                    timestamp_writes: None,
                });
                pass.set_pipeline(kernels.pipeline(dispatch.kernel));
                pass.set_bind_group(0, &bind_group, &[]);
                pass.dispatch_workgroups(groups_x, groups_y, 1);
            }

            encoder.copy_buffer_to_buffer(&output_buffer, 0, &staging, 0, output_bytes);
            queue.submit(std::iter::once(encoder.finish()));
            staging
        })?;

        self.read_back(&staging)
    }

    fn read_back(&self, staging: &wgpu::Buffer) -> Result<Vec<f32>> {
        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.context.wait_idle();

        rx.recv()
            .map_err(|_| FieldError::compute("Readback callback was dropped"))?
            .map_err(|e| FieldError::compute(format!("Map failed: {:?}", e)))?;

        let data = slice.get_mapped_range();
        let result: Vec<f32> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        staging.unmap();
        Ok(result)
    }

    #[allow(clippy::too_many_arguments)]
    fn propagate(
        &self,
        kernel: Kernel,
        array: &TxArray,
        mut geometry: GpuGeometry,
        points: Option<&[[f32; 4]]>,
        shape: (usize, usize),
        wavenumber: f64,
        options: &PropagationOptions,
    ) -> Result<FieldSamples> {
        validate_array(array)?;
        validate_wavenumber(wavenumber)?;

        let count = shape.0 * shape.1;
        let invocations = u32::try_from(count).map_err(|_| {
            FieldError::compute(format!("{} points exceed the kernel index range", count))
        })?;
        let elements = u32::try_from(array.element_count()).map_err(|_| {
            FieldError::compute(format!(
                "{} elements exceed the kernel index range",
                array.element_count()
            ))
        })?;

        geometry.dims[2] = invocations;
        geometry.dims[3] = elements;
        geometry.scalars[0] = wavenumber as f32;

        let start = Instant::now();
        let flat = self.run(
            Dispatch {
                kernel,
                geometry,
                table: array.as_table(),
                points,
                output_seed: None,
                output_len: count * RECORD_WIDTH,
                invocations,
            },
            options,
        )?;

        if options.report_performance {
            report_performance(
                BACKEND,
                kernel.entry_point(),
                count,
                array.element_count(),
                start.elapsed(),
            );
        }
        FieldSamples::from_flat(shape, &flat)
    }
}

fn vec4(v: DVec3, w: f64) -> [f32; 4] {
    [v.x as f32, v.y as f32, v.z as f32, w as f32]
}

impl Propagator for WgpuPropagator {
    fn name(&self) -> &str {
        BACKEND
    }

    fn propagate_rectilinear(
        &self,
        array: &TxArray,
        lattice: &RectilinearLattice,
        wavenumber: f64,
        options: &PropagationOptions,
    ) -> Result<FieldSamples> {
        lattice.validate()?;
        let geometry = GpuGeometry {
            dims: [lattice.rows, lattice.cols, 0, 0],
            origin: vec4(lattice.origin, lattice.spacing),
            vector_1: vec4(lattice.vector_1, 0.0),
            vector_2: vec4(lattice.vector_2, 0.0),
            scalars: [
                0.0,
                (lattice.rows as f32 - 1.0) / 2.0,
                (lattice.cols as f32 - 1.0) / 2.0,
                0.0,
            ],
        };
        let shape = (lattice.rows as usize, lattice.cols as usize);
        self.propagate(Kernel::Rectilinear, array, geometry, None, shape, wavenumber, options)
    }

    fn propagate_hexagonal(
        &self,
        array: &TxArray,
        lattice: &HexagonalLattice,
        wavenumber: f64,
        options: &PropagationOptions,
    ) -> Result<FieldSamples> {
        lattice.validate()?;
        let n = lattice.grid_length();
        let centre = (lattice.side_length - 1) as f32;
        let geometry = GpuGeometry {
            dims: [n, n, 0, 0],
            origin: vec4(lattice.origin, lattice.spacing),
            vector_1: vec4(lattice.vector_1, 0.0),
            vector_2: vec4(lattice.vector_2, 0.0),
            scalars: [0.0, centre, centre, 0.0],
        };
        let shape = (n as usize, n as usize);
        self.propagate(Kernel::Hexagonal, array, geometry, None, shape, wavenumber, options)
    }

    fn propagate_points(
        &self,
        array: &TxArray,
        points: &[DVec3],
        wavenumber: f64,
        options: &PropagationOptions,
    ) -> Result<FieldSamples> {
        validate_points(points)?;
        let packed: Vec<[f32; 4]> = points.iter().map(|&p| vec4(p, 0.0)).collect();
        let geometry = GpuGeometry {
            dims: [packed.len() as u32, 1, 0, 0],
            ..Default::default()
        };
        self.propagate(
            Kernel::Points,
            array,
            geometry,
            Some(&packed),
            (points.len(), 1),
            wavenumber,
            options,
        )
    }

    fn solve_single_focus(
        &self,
        array: &TxArray,
        focal_point: DVec3,
        wavenumber: f64,
        options: &PropagationOptions,
    ) -> Result<TxArray> {
        validate_array(array)?;
        validate_wavenumber(wavenumber)?;
        validate_points(&[focal_point])?;

        let elements = u32::try_from(array.element_count()).map_err(|_| {
            FieldError::compute(format!(
                "{} elements exceed the kernel index range",
                array.element_count()
            ))
        })?;
        let geometry = GpuGeometry {
            dims: [0, 0, elements, elements],
            origin: vec4(focal_point, 0.0),
            scalars: [wavenumber as f32, 0.0, 0.0, 0.0],
            ..Default::default()
        };

        let start = Instant::now();
        let table = array.as_table();
        let solved = self.run(
            Dispatch {
                kernel: Kernel::SingleFocus,
                geometry,
                table,
                points: None,
                output_seed: Some(table),
                output_len: array.element_count() * DESCRIPTOR_WIDTH,
                invocations: elements,
            },
            options,
        )?;

        if options.report_performance {
            report_performance(
                BACKEND,
                Kernel::SingleFocus.entry_point(),
                1,
                array.element_count(),
                start.elapsed(),
            );
        }
        TxArray::from_table(array.name(), &solved)
    }
}
