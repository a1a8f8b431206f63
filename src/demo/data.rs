use crate::system::filesystem::DemoFilesystemReader;

/// Virtual artifact root served in demo mode
pub const DEMO_ROOT: &str = "/demo/artifacts";

pub const DEMO_NODES: [&str; 3] = ["10.0.0.1", "10.0.0.2", "10.0.0.3"];

pub const DEMO_BEANS: [&str; 3] = [
    "java.lang:type=Runtime",
    "org.apache.cassandra.db:type=StorageService",
    "org.apache.cassandra.metrics:type=ClientRequest,scope=Read,name=Latency",
];

const DEMO_OS_RELEASE: &str = r#"NAME="Ubuntu"
VERSION="18.04.6 LTS (Bionic Beaver)"
ID=ubuntu
ID_LIKE=debian
PRETTY_NAME="Ubuntu 18.04.6 LTS"
VERSION_ID="18.04"
VERSION_CODENAME=bionic
"#;

const DEMO_OS_INFO: &str = "kernel_name: Linux
kernel_release: 5.4.0-150-generic
machine_type: x86_64
operating_system: GNU/Linux
";

const DEMO_DEBIAN_VERSION: &str = "10.13\n";

const DEMO_JAVA_CMDLINE: &str = "/usr/lib/jvm/java-8-openjdk-amd64/bin/java -ea -Xms1G -Xmx1G \
-XX:+UseG1GC -Dcassandra.storagedir=/var/lib/cassandra \
-cp /etc/cassandra:/usr/share/cassandra/lib/* org.apache.cassandra.service.CassandraDaemon\n";

const DEMO_JAVA_VERSION: &str = r#"openjdk version "1.8.0_382"
OpenJDK Runtime Environment (build 1.8.0_382-8u382-ga-1~18.04.1-b05)
OpenJDK 64-Bit Server VM (build 25.382-b05, mixed mode)
"#;

const DEMO_PROCESS_LIMITS: &str = "\
Limit                     Soft Limit           Hard Limit           Units
Max cpu time              unlimited            unlimited            seconds
Max file size             unlimited            unlimited            bytes
Max data size             unlimited            unlimited            bytes
Max stack size            8388608              unlimited            bytes
Max core file size        0                    unlimited            bytes
Max resident set          unlimited            unlimited            bytes
Max processes             32768                32768                processes
Max open files            100000               100000               files
Max locked memory         unlimited            unlimited            bytes
Max address space         unlimited            unlimited            bytes
Max file locks            unlimited            unlimited            locks
Max pending signals       63448                63448                signals
Max msgqueue size         819200               819200               bytes
Max nice priority         0                    0
Max realtime priority     0                    0
Max realtime timeout      unlimited            unlimited            us
";

const DEMO_PS_AUX: &str = "\
USER       PID %CPU %MEM    VSZ   RSS TTY      STAT START   TIME COMMAND
root         1  0.0  0.0   4628   812 ?        Ss   08:01   0:00 /bin/sh -c cassandra -f
cassandra   42 12.1 24.3 4861232 1993840 ?     Sl   08:01   3:12 java -Xms1G -Xmx1G org.apache.cassandra.service.CassandraDaemon
root       311  0.0  0.0  34400  2868 ?        Rs   08:44   0:00 ps auxww
";

/// JMX dump with one entry per demo bean
fn demo_jmx_dump() -> String {
    let beans: Vec<serde_json::Value> = DEMO_BEANS
        .iter()
        .map(|name| serde_json::json!({ "name": name, "modelerType": "javax.management.StandardMBean" }))
        .collect();
    serde_json::json!({ "beans": beans }).to_string()
}

/// Three-node bundle that satisfies the default plan
pub fn demo_bundle() -> DemoFilesystemReader {
    let mut reader = DemoFilesystemReader::new();
    for node in DEMO_NODES {
        let file = |relative: &str| format!("{}/nodes/{}/{}", DEMO_ROOT, node, relative);
        reader = reader
            .with_file(file("os-release"), DEMO_OS_RELEASE)
            .with_file(file("os-info.txt"), DEMO_OS_INFO)
            .with_file(file("debian_version"), DEMO_DEBIAN_VERSION)
            .with_file(file("java_cmdline"), DEMO_JAVA_CMDLINE)
            .with_file(file("java_version.txt"), DEMO_JAVA_VERSION)
            .with_file(file("process_limits"), DEMO_PROCESS_LIMITS)
            .with_file(file("os-metrics/ps-aux.txt"), DEMO_PS_AUX)
            .with_file(file("jmx_dump.json"), demo_jmx_dump());
    }
    reader.with_file(
        format!("{}/collect-info.audit.log", DEMO_ROOT),
        "ps auxww > os-metrics/ps-aux.txt\n",
    )
}
