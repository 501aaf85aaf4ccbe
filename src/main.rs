use obd2_scanner::{Obd2Scanner, ScannerConfig};

#[tokio::main]
async fn main() {
    env_logger::init();

    let scanner = Obd2Scanner::new(ScannerConfig::default());
    if std::env::var_os("OBD2_PRODUCTION").is_some() {
        scanner.set_simulation(false);
    }

    let devices = match scanner.scan_for_devices().await {
        Ok(devices) => devices,
        Err(e) => {
            eprintln!("Device scan failed: {}", e);
            return;
        }
    };
    println!("Devices: {:#?}", devices);

    let Some(device) = devices.first() else {
        println!("No OBD-II adapters found");
        return;
    };

    if let Err(e) = scanner.connect(device).await {
        eprintln!("Connecting to {} failed: {}", device.display_name, e);
        return;
    }

    println!("VIN: {:?}", scanner.read_vin().await);
    match scanner.identify_vehicle().await {
        Ok(Some(vehicle)) => println!("Vehicle: {}", vehicle),
        Ok(None) => println!("Vehicle: not available"),
        Err(e) => println!("Vehicle detection failed: {}", e),
    }

    match scanner.scan_for_dtcs().await {
        Ok(codes) if codes.is_empty() => println!("No trouble codes stored"),
        Ok(codes) => {
            println!("DTCs:");
            for code in codes {
                println!("  - {}", code);
            }
        }
        Err(e) => println!("DTC scan failed: {}", e),
    }

    if let Err(e) = scanner.disconnect().await {
        eprintln!("Disconnect failed: {}", e);
    }
}
