// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The long-lived Vulkan objects: instance, validation messenger, surface, physical and
//! logical device, queues and the command pool.

use super::conversions::{backend_error, memory_types};
use anyhow::{anyhow, Context, Result};
use ash::{vk, Device, Entry, Instance};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle};
use std::borrow::Cow;
use std::ffi::{c_void, CStr, CString};
use umbra_core::platform::window::UmbraWindow;
use umbra_core::renderer::api::image::{max_usable_sample_count, SampleCount};
use umbra_core::renderer::api::memory::MemoryType;
use umbra_core::renderer::error::{ResourceError, ResourceKind};

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

const DEPTH_FORMAT_CANDIDATES: [vk::Format; 5] = [
    vk::Format::D32_SFLOAT_S8_UINT,
    vk::Format::D32_SFLOAT,
    vk::Format::D24_UNORM_S8_UINT,
    vk::Format::D16_UNORM_S8_UINT,
    vk::Format::D16_UNORM,
];

/// The queue family indices the renderer submits to. They may be equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    /// Family used for graphics and transfer work.
    pub graphics: u32,
    /// Family used for presentation.
    pub present: u32,
}

impl QueueFamilyIndices {
    /// The distinct family indices, graphics first.
    pub fn unique(&self) -> Vec<u32> {
        if self.graphics == self.present {
            vec![self.graphics]
        } else {
            vec![self.graphics, self.present]
        }
    }
}

/// Finds a graphics family and a present family, preferring one family that does both.
///
/// Falls back to the first graphics family and the first present family. Returns `None`
/// unless both exist.
pub fn find_queue_families(
    families: &[vk::QueueFamilyProperties],
    supports_present: impl Fn(u32) -> bool,
) -> Option<QueueFamilyIndices> {
    let usable = || {
        families
            .iter()
            .enumerate()
            .filter(|(_, family)| family.queue_count > 0)
            .map(|(index, family)| (index as u32, family))
    };
    let can_draw = |family: &vk::QueueFamilyProperties| {
        family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
    };

    let shared = usable().find(|&(index, family)| can_draw(family) && supports_present(index));
    if let Some((index, _)) = shared {
        return Some(QueueFamilyIndices {
            graphics: index,
            present: index,
        });
    }
    let graphics = usable().find(|&(_, family)| can_draw(family))?.0;
    let present = usable().find(|&(index, _)| supports_present(index))?.0;
    Some(QueueFamilyIndices { graphics, present })
}

/// Routes validation messages to the `log` facade by severity.
unsafe extern "system" fn vulkan_debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut c_void,
) -> vk::Bool32 {
    let message = if callback_data.is_null() || (*callback_data).p_message.is_null() {
        Cow::Borrowed("<no message>")
    } else {
        CStr::from_ptr((*callback_data).p_message).to_string_lossy()
    };

    match severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            log::error!("[vulkan {message_type:?}] {message}")
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            log::warn!("[vulkan {message_type:?}] {message}")
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => {
            log::debug!("[vulkan {message_type:?}] {message}")
        }
        _ => log::trace!("[vulkan {message_type:?}] {message}"),
    }
    vk::FALSE
}

struct DebugMessenger {
    loader: ash::ext::debug_utils::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
}

impl DebugMessenger {
    fn new(entry: &Entry, instance: &Instance) -> Result<Self> {
        let loader = ash::ext::debug_utils::Instance::new(entry, instance);
        let info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                    | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                    | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(vulkan_debug_callback));
        let messenger = unsafe { loader.create_debug_utils_messenger(&info, None) }
            .context("Failed to create the debug messenger")?;
        log::debug!("Validation debug messenger installed.");
        Ok(Self { loader, messenger })
    }
}

/// Owns every object whose lifetime spans the whole run.
pub struct VulkanContext {
    _entry: Entry,
    /// The Vulkan instance.
    pub instance: Instance,
    debug: Option<DebugMessenger>,
    /// Surface extension loader.
    pub surface_loader: ash::khr::surface::Instance,
    /// The window surface.
    pub surface: vk::SurfaceKHR,
    /// The selected physical device.
    pub physical_device: vk::PhysicalDevice,
    /// Its human-readable name.
    pub device_name: String,
    /// Queue families in use.
    pub queue_families: QueueFamilyIndices,
    /// The logical device.
    pub device: Device,
    /// Queue for graphics and transfer submissions.
    pub graphics_queue: vk::Queue,
    /// Queue for presentation.
    pub present_queue: vk::Queue,
    /// Swapchain extension loader.
    pub swapchain_loader: ash::khr::swapchain::Device,
    /// Pool for every command buffer; buffers can be reset individually.
    pub command_pool: vk::CommandPool,
    /// Memory types of the physical device, for first-fit selection.
    pub memory_types: Vec<MemoryType>,
    /// Highest sample count usable for both color and depth.
    pub msaa_samples: SampleCount,
    /// Depth attachment format.
    pub depth_format: vk::Format,
    /// Maximum sampler anisotropy, if the device supports anisotropic filtering.
    pub max_anisotropy: Option<f32>,
}

impl std::fmt::Debug for VulkanContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VulkanContext")
            .field("device_name", &self.device_name)
            .field("queue_families", &self.queue_families)
            .field("msaa_samples", &self.msaa_samples)
            .field("depth_format", &self.depth_format)
            .field("validation", &self.debug.is_some())
            .finish_non_exhaustive()
    }
}

impl VulkanContext {
    /// Creates the instance, surface and device for `window`.
    ///
    /// ## Errors
    ///
    /// Any failure here is fatal: no loader, no suitable device, or a driver error.
    pub fn new(window: &dyn UmbraWindow, app_name: &str, enable_validation: bool) -> Result<Self> {
        log::info!("Initializing Vulkan context...");

        // --- 1. Instance ---
        let entry = unsafe { Entry::load() }.context("Failed to load the Vulkan library")?;
        let display = window
            .display_handle()
            .map_err(|e| anyhow!("Failed to get display handle: {e}"))?
            .as_raw();
        let validation = enable_validation && validation_layer_available(&entry);
        if enable_validation && !validation {
            log::warn!("Validation requested but {VALIDATION_LAYER:?} is not installed.");
        }
        let instance = create_instance(&entry, display, app_name, validation)?;

        // --- 2. Validation messenger ---
        let debug = if validation {
            Some(DebugMessenger::new(&entry, &instance)?)
        } else {
            None
        };

        // --- 3. Surface ---
        let window_handle = window
            .window_handle()
            .map_err(|e| anyhow!("Failed to get window handle: {e}"))?
            .as_raw();
        let surface =
            unsafe { ash_window::create_surface(&entry, &instance, display, window_handle, None) }
                .context("Failed to create the window surface")?;
        let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

        // --- 4. Physical device ---
        let (physical_device, queue_families) =
            pick_physical_device(&instance, &surface_loader, surface)?;
        let properties = unsafe { instance.get_physical_device_properties(physical_device) };
        let device_name = properties
            .device_name_as_c_str()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "<unnamed>".to_string());
        let features = unsafe { instance.get_physical_device_features(physical_device) };
        let msaa_samples = max_usable_sample_count(
            properties.limits.framebuffer_color_sample_counts.as_raw(),
            properties.limits.framebuffer_depth_sample_counts.as_raw(),
        );
        let max_anisotropy = (features.sampler_anisotropy == vk::TRUE)
            .then_some(properties.limits.max_sampler_anisotropy);
        let memory_types = memory_types(&unsafe {
            instance.get_physical_device_memory_properties(physical_device)
        });
        let depth_format = find_depth_format(&instance, physical_device)?;
        log::info!(
            "Using GPU \"{}\" ({:?}), {:?} MSAA, depth {:?}",
            device_name,
            properties.device_type,
            msaa_samples,
            depth_format
        );

        // --- 5. Logical device and queues ---
        let device = create_logical_device(
            &instance,
            physical_device,
            queue_families,
            max_anisotropy.is_some(),
        )?;
        let graphics_queue = unsafe { device.get_device_queue(queue_families.graphics, 0) };
        let present_queue = unsafe { device.get_device_queue(queue_families.present, 0) };
        let swapchain_loader = ash::khr::swapchain::Device::new(&instance, &device);

        // --- 6. Command pool ---
        let pool_info = vk::CommandPoolCreateInfo::default()
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .queue_family_index(queue_families.graphics);
        let command_pool = unsafe { device.create_command_pool(&pool_info, None) }
            .context("Failed to create the command pool")?;

        log::info!("Vulkan context ready.");
        Ok(Self {
            _entry: entry,
            instance,
            debug,
            surface_loader,
            surface,
            physical_device,
            device_name,
            queue_families,
            device,
            graphics_queue,
            present_queue,
            swapchain_loader,
            command_pool,
            memory_types,
            msaa_samples,
            depth_format,
            max_anisotropy,
        })
    }

    /// Allocates `count` primary command buffers from the shared pool.
    pub fn allocate_command_buffers(
        &self,
        count: u32,
    ) -> Result<Vec<vk::CommandBuffer>, ResourceError> {
        let info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);
        unsafe { self.device.allocate_command_buffers(&info) }.map_err(|e| {
            backend_error(ResourceKind::CommandBuffer, format!("count={count}"), e)
        })
    }

    /// Starts a throwaway command buffer for an upload or a layout transition.
    pub fn begin_single_time_commands(&self) -> Result<vk::CommandBuffer, ResourceError> {
        let cmd = self.allocate_command_buffers(1)?[0];
        let begin = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe { self.device.begin_command_buffer(cmd, &begin) }.map_err(|e| {
            backend_error(ResourceKind::CommandBuffer, "begin one-time".to_string(), e)
        })?;
        Ok(cmd)
    }

    /// Ends, submits and frees a command buffer from
    /// [`VulkanContext::begin_single_time_commands`], waiting for the queue to go idle.
    pub fn end_single_time_commands(&self, cmd: vk::CommandBuffer) -> Result<(), ResourceError> {
        let buffers = [cmd];
        let submit = vk::SubmitInfo::default().command_buffers(&buffers);
        let result = unsafe {
            self.device
                .end_command_buffer(cmd)
                .and_then(|()| {
                    self.device
                        .queue_submit(self.graphics_queue, &[submit], vk::Fence::null())
                })
                .and_then(|()| self.device.queue_wait_idle(self.graphics_queue))
        };
        unsafe { self.device.free_command_buffers(self.command_pool, &buffers) };
        result.map_err(|e| {
            backend_error(ResourceKind::CommandBuffer, "submit one-time".to_string(), e)
        })
    }

    /// Format properties of `format` on the selected device.
    pub fn format_properties(&self, format: vk::Format) -> vk::FormatProperties {
        unsafe {
            self.instance
                .get_physical_device_format_properties(self.physical_device, format)
        }
    }

    /// Destroys the command pool, device, surface, debug messenger and instance, in that
    /// order. Every other object must already be gone.
    pub(crate) fn destroy(&mut self) {
        unsafe {
            self.device.destroy_command_pool(self.command_pool, None);
            self.device.destroy_device(None);
            self.surface_loader.destroy_surface(self.surface, None);
            if let Some(debug) = self.debug.take() {
                debug
                    .loader
                    .destroy_debug_utils_messenger(debug.messenger, None);
            }
            self.instance.destroy_instance(None);
        }
        log::info!("Vulkan context destroyed.");
    }
}

fn validation_layer_available(entry: &Entry) -> bool {
    unsafe { entry.enumerate_instance_layer_properties() }
        .map(|layers| {
            layers
                .iter()
                .any(|layer| layer.layer_name_as_c_str().is_ok_and(|n| n == VALIDATION_LAYER))
        })
        .unwrap_or(false)
}

fn create_instance(
    entry: &Entry,
    display: RawDisplayHandle,
    app_name: &str,
    validation: bool,
) -> Result<Instance> {
    let app_name = CString::new(app_name).context("Application name contains a NUL byte")?;
    let app_info = vk::ApplicationInfo::default()
        .application_name(&app_name)
        .application_version(vk::make_api_version(0, 0, 1, 0))
        .engine_name(c"Umbra")
        .engine_version(vk::make_api_version(0, 0, 1, 0))
        .api_version(vk::API_VERSION_1_0);

    let mut extensions = ash_window::enumerate_required_extensions(display)
        .context("Failed to query the surface extensions")?
        .to_vec();
    let layers = if validation {
        extensions.push(ash::ext::debug_utils::NAME.as_ptr());
        vec![VALIDATION_LAYER.as_ptr()]
    } else {
        Vec::new()
    };

    let info = vk::InstanceCreateInfo::default()
        .application_info(&app_info)
        .enabled_extension_names(&extensions)
        .enabled_layer_names(&layers);
    let instance =
        unsafe { entry.create_instance(&info, None) }.context("Failed to create the instance")?;
    log::info!(
        "Vulkan instance created ({} extensions, validation {}).",
        extensions.len(),
        if validation { "on" } else { "off" }
    );
    Ok(instance)
}

/// Picks the first device that can draw and present to `surface`, preferring a discrete GPU.
pub fn pick_physical_device(
    instance: &Instance,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
) -> Result<(vk::PhysicalDevice, QueueFamilyIndices)> {
    let devices = unsafe { instance.enumerate_physical_devices() }
        .context("Failed to enumerate physical devices")?;

    let mut suitable = Vec::new();
    for device in devices {
        let families = unsafe { instance.get_physical_device_queue_family_properties(device) };
        let Some(indices) = find_queue_families(&families, |index| unsafe {
            surface_loader
                .get_physical_device_surface_support(device, index, surface)
                .unwrap_or(false)
        }) else {
            continue;
        };
        if !supports_swapchain(instance, device) {
            continue;
        }
        let formats =
            unsafe { surface_loader.get_physical_device_surface_formats(device, surface) }
                .unwrap_or_default();
        let modes =
            unsafe { surface_loader.get_physical_device_surface_present_modes(device, surface) }
                .unwrap_or_default();
        if formats.is_empty() || modes.is_empty() {
            continue;
        }
        let kind = unsafe { instance.get_physical_device_properties(device) }.device_type;
        suitable.push((kind, device, indices));
    }

    suitable
        .iter()
        .find(|(kind, ..)| *kind == vk::PhysicalDeviceType::DISCRETE_GPU)
        .or_else(|| suitable.first())
        .map(|&(_, device, indices)| (device, indices))
        .ok_or_else(|| anyhow!("No GPU can render and present to this window"))
}

fn supports_swapchain(instance: &Instance, device: vk::PhysicalDevice) -> bool {
    unsafe { instance.enumerate_device_extension_properties(device) }
        .map(|extensions| {
            extensions
                .iter()
                .any(|ext| {
                    ext.extension_name_as_c_str()
                        .is_ok_and(|n| n == ash::khr::swapchain::NAME)
                })
        })
        .unwrap_or(false)
}

fn find_depth_format(instance: &Instance, device: vk::PhysicalDevice) -> Result<vk::Format> {
    DEPTH_FORMAT_CANDIDATES
        .into_iter()
        .find(|&format| {
            let props = unsafe { instance.get_physical_device_format_properties(device, format) };
            props
                .optimal_tiling_features
                .contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
        })
        .ok_or_else(|| anyhow!("No supported depth attachment format"))
}

fn create_logical_device(
    instance: &Instance,
    physical_device: vk::PhysicalDevice,
    families: QueueFamilyIndices,
    anisotropy: bool,
) -> Result<Device> {
    let priorities = [1.0_f32];
    let queue_infos: Vec<_> = families
        .unique()
        .into_iter()
        .map(|family| {
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(family)
                .queue_priorities(&priorities)
        })
        .collect();
    let features = vk::PhysicalDeviceFeatures::default().sampler_anisotropy(anisotropy);
    let extensions = [ash::khr::swapchain::NAME.as_ptr()];

    let info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_infos)
        .enabled_features(&features)
        .enabled_extension_names(&extensions);
    let device = unsafe { instance.create_device(physical_device, &info, None) }
        .context("Failed to create the logical device")?;
    log::info!("Logical device created ({} queue families).", queue_infos.len());
    Ok(device)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_shared_family_is_reported_once() {
        let families = [family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER)];
        let indices = find_queue_families(&families, |_| true).unwrap();
        assert_eq!(indices, QueueFamilyIndices { graphics: 0, present: 0 });
        assert_eq!(indices.unique(), vec![0]);
    }

    #[test]
    fn test_separate_present_family() {
        let families = [
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::COMPUTE),
        ];
        let indices = find_queue_families(&families, |i| i == 2).unwrap();
        assert_eq!(indices, QueueFamilyIndices { graphics: 1, present: 2 });
        assert_eq!(indices.unique(), vec![1, 2]);
    }

    #[test]
    fn test_prefers_a_family_that_does_both() {
        let families = [
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::TRANSFER),
        ];
        let indices = find_queue_families(&families, |i| i != 0).unwrap();
        assert_eq!(indices, QueueFamilyIndices { graphics: 1, present: 1 });
    }

    #[test]
    fn test_missing_family_yields_none() {
        let families = [family(vk::QueueFlags::COMPUTE)];
        assert!(find_queue_families(&families, |_| true).is_none());
        let graphics_only = [family(vk::QueueFlags::GRAPHICS)];
        assert!(find_queue_families(&graphics_only, |_| false).is_none());
    }

    #[test]
    fn test_empty_families_are_skipped() {
        let mut empty = family(vk::QueueFlags::GRAPHICS);
        empty.queue_count = 0;
        let families = [empty, family(vk::QueueFlags::GRAPHICS)];
        let indices = find_queue_families(&families, |_| true).unwrap();
        assert_eq!(indices.graphics, 1);
        assert_eq!(indices.present, 1);
    }
}
